//! I/O traits and implementations for the registration client
//!
//! HTTP requests go through [`HttpTransport`] and WebSocket connections are
//! opened through [`SocketConnector`]. Both are mockall-friendly so the
//! client can be tested without a network. The default implementations use
//! reqwest and tokio-tungstenite.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::{RegistroError, Result};

// ============================================================================
// HTTP
// ============================================================================

/// HTTP method used by the backend API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// Value of a multipart form field
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

/// Single multipart form field
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }
}

/// Request body
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    /// Pre-serialized JSON document
    Json(String),
    Multipart(Vec<FormPart>),
}

/// Outgoing HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    /// Look up a header value, ignoring name case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over the HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpTransport: Send + Sync {
    /// Send a request and return the status and raw body
    ///
    /// Only transport failures are errors here; any HTTP status is returned
    /// as a response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Production HTTP transport using reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport that applies `timeout` to every request
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistroError::Config(format!("Building HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn build_form(parts: Vec<FormPart>) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in parts {
            form = match part.value {
                FormValue::Text(value) => form.text(part.name, value),
                FormValue::File {
                    file_name,
                    mime_type,
                    bytes,
                } => {
                    let file = reqwest::multipart::Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(&mime_type)
                        .map_err(|e| {
                            RegistroError::Request(format!("Invalid MIME type {}: {}", mime_type, e))
                        })?;
                    form.part(part.name, file)
                }
            };
        }
        Ok(form)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        tracing::debug!("{} {}", method, url);

        let mut builder = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(json) => builder.body(json),
            RequestBody::Multipart(parts) => builder.multipart(Self::build_form(parts)?),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| RegistroError::Request(format!("{} {} failed: {}", method, url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RegistroError::Request(format!("Reading response body: {}", e)))?;

        tracing::debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// WebSocket
// ============================================================================

/// Socket halves returned by a [`SocketConnector`]
pub struct SocketPair {
    /// Inbound text frames
    pub reader: Box<dyn SocketReader>,
    /// Handle used to close the socket
    pub writer: Box<dyn SocketWriter>,
}

/// Trait for reading inbound text frames
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait SocketReader: Send {
    /// Read the next text frame
    ///
    /// Returns `Ok(Some(text))` for a frame, `Ok(None)` once the socket is
    /// closed, or an error if reading failed.
    async fn next_text(&mut self) -> Result<Option<String>>;
}

/// Trait for the outbound half of a socket
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait SocketWriter: Send {
    /// Close the socket with a normal close frame
    async fn close(&mut self) -> Result<()>;
}

/// Trait for opening WebSocket connections
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait SocketConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<SocketPair>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// tokio-tungstenite implementation of SocketReader
pub struct TungsteniteReader {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl SocketReader for TungsteniteReader {
    async fn next_text(&mut self) -> Result<Option<String>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => return Ok(Some(text.as_str().to_string())),
                Ok(WsMessage::Close(_)) => return Ok(None),
                Ok(_) => continue,
                Err(e) => return Err(RegistroError::WebSocket(e.to_string())),
            }
        }
        Ok(None)
    }
}

/// tokio-tungstenite implementation of SocketWriter
pub struct TungsteniteWriter {
    sink: SplitSink<WsStream, WsMessage>,
}

#[async_trait]
impl SocketWriter for TungsteniteWriter {
    async fn close(&mut self) -> Result<()> {
        self.sink
            .close()
            .await
            .map_err(|e| RegistroError::WebSocket(e.to_string()))
    }
}

/// tokio-tungstenite implementation of SocketConnector
#[derive(Debug, Default, Clone)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SocketConnector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<SocketPair> {
        debug!("Opening WebSocket to {}", url);
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| RegistroError::WebSocket(format!("Failed to connect to {}: {}", url, e)))?;
        let (sink, stream) = stream.split();
        Ok(SocketPair {
            reader: Box::new(TungsteniteReader { stream }),
            writer: Box::new(TungsteniteWriter { sink }),
        })
    }
}
