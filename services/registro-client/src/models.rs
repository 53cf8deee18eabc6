//! Wire types exchanged with the registration backend
//!
//! Field names follow the backend's camelCase JSON. Records keep any
//! fields this client does not know about in `extra`, so a value read
//! from the server can be written back without loss.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::io::{FormPart, FormValue};

/// Server-assigned record identifier, numeric or textual
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Number(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

/// Credentials posted to `/auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful login response
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Registration form payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(default)]
    pub dni: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub celular: String,
    #[serde(default)]
    pub municipio: String,
    #[serde(default)]
    pub seccion_electoral: String,
    #[serde(default)]
    pub escuela: String,
    #[serde(default)]
    pub direccion: String,
}

/// A registered user as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(default)]
    pub dni: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub celular: String,
    #[serde(default)]
    pub municipio: String,
    #[serde(default)]
    pub seccion_electoral: String,
    #[serde(default)]
    pub escuela: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foto_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn has_photo(&self) -> bool {
        self.foto_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

/// Binary file attached to a report
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Incident report to submit
///
/// Sent as multipart form data rather than JSON so that an attachment can
/// travel with it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub kind: String,
    pub description: String,
    pub severity: String,
    pub attachment: Option<Attachment>,
}

impl NewReport {
    pub fn new(
        kind: impl Into<String>,
        description: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
            severity: severity.into(),
            attachment: None,
        }
    }

    /// High-severity emergency report
    pub fn emergency(description: impl Into<String>) -> Self {
        Self::new("emergency", description, "high")
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Multipart fields, one per report field
    pub fn to_form_parts(&self) -> Vec<FormPart> {
        let mut parts = vec![
            FormPart::text("type", &self.kind),
            FormPart::text("description", &self.description),
            FormPart::text("severity", &self.severity),
        ];
        if let Some(attachment) = &self.attachment {
            parts.push(FormPart {
                name: "attachment".to_string(),
                value: FormValue::File {
                    file_name: attachment.file_name.clone(),
                    mime_type: attachment.mime_type.clone(),
                    bytes: attachment.bytes.clone(),
                },
            });
        }
        parts
    }
}

/// A stored incident report
///
/// The backend may acknowledge a new report without echoing it back, so
/// every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Chat message to send
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMessage {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl NewMessage {
    pub fn chat(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: "chat".to_string(),
        }
    }
}

/// A stored chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Query filters for list endpoints, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(Vec<(String, String)>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Form-urlencoded query string without the leading `?`
    pub fn to_query(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.0)
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
