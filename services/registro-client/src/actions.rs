//! User actions: registration, chat and emergency reports
//!
//! Each action calls the [`ApiClient`] and reports the outcome through a
//! [`NotificationSink`]. Errors are also returned so callers can react
//! (close a form, keep it open, ...).

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{Message, NewMessage, NewReport, NewUser, Report, User};
use crate::notification::{Notification, NotificationSink};

/// Profile photo picked in the registration form
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Photo {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:` URL with the photo inlined as base64
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// Result of a registration
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationOutcome {
    pub user: User,
    /// Whether a photo was supplied and stored
    pub photo_saved: bool,
}

/// Register a user, then attach the photo if one was given
///
/// The registration itself succeeding is what counts: a failed photo
/// upload is logged and surfaced as a warning, not an error.
pub async fn submit_registration(
    client: &ApiClient,
    form: &NewUser,
    photo: Option<&Photo>,
    sink: &dyn NotificationSink,
) -> Result<RegistrationOutcome> {
    let user = match client.create_user(form).await {
        Ok(user) => user,
        Err(e) => {
            sink.notify(Notification::error(format!("❌ Error: {}", e.message())));
            return Err(e);
        }
    };
    debug!("Registered user {}", user.id);

    let mut photo_saved = false;
    if let Some(photo) = photo.filter(|p| !p.is_empty()) {
        let patch = json!({ "fotoUrl": photo.to_data_url() });
        match client.update_user(&user.id, &patch).await {
            Ok(_) => photo_saved = true,
            Err(e) => {
                warn!("Photo upload for user {} failed: {}", user.id, e);
                sink.notify(Notification::warning(format!(
                    "⚠️ Foto no guardada: {}",
                    e.message()
                )));
            }
        }
    }

    sink.notify(Notification::success("✅ Registro exitoso"));
    Ok(RegistrationOutcome { user, photo_saved })
}

/// Send a chat message; blank input is ignored
pub async fn send_chat_message(
    client: &ApiClient,
    text: &str,
    sink: &dyn NotificationSink,
) -> Result<Option<Message>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    match client.send_message(&NewMessage::chat(text)).await {
        Ok(message) => {
            sink.notify(Notification::success("Mensaje enviado"));
            Ok(Some(message))
        }
        Err(e) => {
            sink.notify(Notification::error("Error enviando mensaje"));
            Err(e)
        }
    }
}

/// File a high-severity emergency report
///
/// Blank input produces a warning and no request.
pub async fn send_emergency(
    client: &ApiClient,
    text: &str,
    sink: &dyn NotificationSink,
) -> Result<Option<Report>> {
    let text = text.trim();
    if text.is_empty() {
        sink.notify(Notification::warning("Por favor escribe un mensaje"));
        return Ok(None);
    }

    match client.create_report(&NewReport::emergency(text)).await {
        Ok(report) => {
            sink.notify(Notification::success("🚨 Emergencia enviada"));
            Ok(Some(report))
        }
        Err(e) => {
            sink.notify(Notification::error("Error enviando emergencia"));
            Err(e)
        }
    }
}
