//! Registration backend client
//!
//! [`ApiClient`] is the single point of contact with the backend: it owns
//! the session token, attaches it to every HTTP request, and manages the
//! notification WebSocket.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::config::{ApiConfig, Config, ReconnectConfig};
use crate::connection::SharedSocketState;
use crate::error::{RegistroError, Result};
use crate::events::ClientEvent;
use crate::io::{
    HttpMethod, HttpRequest, HttpTransport, ReqwestTransport, RequestBody, SocketConnector,
    TungsteniteConnector,
};
use crate::models::{
    Filters, LoginRequest, LoginResponse, Message, NewMessage, NewReport, NewUser, RecordId,
    Report, User,
};
use crate::storage::{Storage, TOKEN_KEY};

/// Message used when a failed response carries none of its own
pub const FALLBACK_ERROR_MESSAGE: &str = "Request failed";

/// Client for the registration backend
pub struct ApiClient {
    api: ApiConfig,
    transport: Arc<dyn HttpTransport>,
    storage: Arc<dyn Storage>,
    token: RwLock<Option<String>>,
    socket: SharedSocketState,
    event_sender: broadcast::Sender<ClientEvent>,
}

impl ApiClient {
    /// Create a client with the reqwest transport and tokio-tungstenite
    /// connector
    pub fn new(config: &Config, storage: Arc<dyn Storage>) -> Result<Self> {
        let transport = ReqwestTransport::new(Duration::from_millis(config.api.timeout_ms))?;
        Ok(Self::with_io(
            config.api.clone(),
            config.reconnect.clone(),
            Arc::new(transport),
            Arc::new(TungsteniteConnector::new()),
            storage,
        ))
    }

    /// Create a client with custom I/O
    ///
    /// A token persisted by an earlier login is restored from `storage`.
    pub fn with_io(
        api: ApiConfig,
        reconnect: ReconnectConfig,
        transport: Arc<dyn HttpTransport>,
        connector: Arc<dyn SocketConnector>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let token = match storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("Could not restore session token: {}", e);
                None
            }
        };
        debug!(
            "Created API client for {} (session restored: {})",
            api.base_url,
            token.is_some()
        );

        let (event_sender, _) = broadcast::channel(100);
        let socket = SharedSocketState::new(
            api.ws_endpoint(),
            reconnect,
            connector,
            event_sender.clone(),
        );

        Self {
            api,
            transport,
            storage,
            token: RwLock::new(token),
            socket,
            event_sender,
        }
    }

    /// Subscribe to connection and session events
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.event_sender.subscribe()
    }

    /// Current session token, if any
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Log in and keep the returned token for all later requests
    ///
    /// Any failure, including a rejected login, is an
    /// [`RegistroError::Auth`] and leaves the current token untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        debug!("Logging in as {}", email);
        let body = json_body(&LoginRequest { email, password }).map_err(|e| e.into_auth())?;
        let response: LoginResponse = self
            .request(HttpMethod::Post, "/auth/login", body)
            .await
            .map_err(|e| e.into_auth())?;
        if response.token.is_empty() {
            return Err(RegistroError::Auth(
                "Login response carried an empty token".to_string(),
            ));
        }

        self.storage
            .set(TOKEN_KEY, &response.token)
            .map_err(|e| e.into_auth())?;
        *self.token.write().await = Some(response.token.clone());

        info!("Logged in as {}", email);
        let _ = self.event_sender.send(ClientEvent::LoggedIn);
        Ok(response)
    }

    /// Register a new account; failures are [`RegistroError::Auth`]
    pub async fn register(&self, user: &NewUser) -> Result<Value> {
        let body = json_body(user).map_err(|e| e.into_auth())?;
        self.request(HttpMethod::Post, "/auth/register", body)
            .await
            .map_err(|e| e.into_auth())
    }

    /// Drop the session and close the WebSocket
    ///
    /// Safe to call repeatedly. The in-memory token is cleared even when
    /// removing the persisted copy fails.
    pub async fn logout(&self) -> Result<()> {
        let had_token = self.token.write().await.take().is_some();
        self.socket.close().await;
        self.storage.remove(TOKEN_KEY)?;

        if had_token {
            info!("Logged out");
            let _ = self.event_sender.send(ClientEvent::LoggedOut);
        }
        Ok(())
    }

    /// Forget the session token without touching the WebSocket
    pub async fn clear_token(&self) -> Result<()> {
        *self.token.write().await = None;
        self.storage.remove(TOKEN_KEY)
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn get_users(&self, filters: &Filters) -> Result<Vec<User>> {
        self.request(HttpMethod::Get, &with_query("/users", filters), RequestBody::Empty)
            .await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.request(HttpMethod::Post, "/users", json_body(user)?)
            .await
    }

    /// Update selected fields of a user; the patch is sent as-is
    pub async fn update_user<T: Serialize + ?Sized>(
        &self,
        id: &RecordId,
        patch: &T,
    ) -> Result<Value> {
        self.request(HttpMethod::Put, &format!("/users/{}", id), json_body(patch)?)
            .await
    }

    pub async fn delete_user(&self, id: &RecordId) -> Result<Value> {
        self.request(HttpMethod::Delete, &format!("/users/{}", id), RequestBody::Empty)
            .await
    }

    // ========================================================================
    // Reports
    // ========================================================================

    pub async fn get_reports(&self, filters: &Filters) -> Result<Vec<Report>> {
        self.request(HttpMethod::Get, &with_query("/reports", filters), RequestBody::Empty)
            .await
    }

    /// Submit a report as multipart form data
    pub async fn create_report(&self, report: &NewReport) -> Result<Report> {
        self.request(
            HttpMethod::Post,
            "/reports",
            RequestBody::Multipart(report.to_form_parts()),
        )
        .await
    }

    pub async fn update_report<T: Serialize + ?Sized>(
        &self,
        id: &RecordId,
        patch: &T,
    ) -> Result<Value> {
        self.request(HttpMethod::Put, &format!("/reports/{}", id), json_body(patch)?)
            .await
    }

    // ========================================================================
    // Messages
    // ========================================================================

    pub async fn get_messages(&self) -> Result<Vec<Message>> {
        self.request(HttpMethod::Get, "/messages", RequestBody::Empty)
            .await
    }

    pub async fn send_message(&self, message: &NewMessage) -> Result<Message> {
        self.request(HttpMethod::Post, "/messages", json_body(message)?)
            .await
    }

    // ========================================================================
    // WebSocket
    // ========================================================================

    /// Open the notification WebSocket
    ///
    /// Does nothing if a socket is already open. If the attempt fails the
    /// error is returned and, with reconnect enabled, retries are scheduled
    /// just as for a socket that closed.
    pub async fn connect_websocket(&self) -> Result<()> {
        self.socket.open().await
    }

    /// Close the WebSocket and cancel any pending reconnect
    pub async fn disconnect_websocket(&self) {
        self.socket.close().await;
    }

    pub async fn is_websocket_connected(&self) -> bool {
        self.socket.is_connected().await
    }

    pub async fn is_reconnecting(&self) -> bool {
        self.socket.is_reconnecting().await
    }

    /// Reconnect attempts used since the last explicit connect
    pub async fn reconnect_attempts(&self) -> u32 {
        self.socket.reconnect_attempts().await
    }

    // ========================================================================
    // Request dispatch
    // ========================================================================

    /// Send an authenticated request and parse the response body
    async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: RequestBody,
    ) -> Result<T> {
        let url = format!("{}{}", self.api.base_url, path);

        let mut headers = Vec::with_capacity(2);
        if !matches!(body, RequestBody::Multipart(_)) {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = self.token.read().await.as_deref() {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        let response = self
            .transport
            .send(HttpRequest {
                method,
                url: url.clone(),
                headers,
                body,
            })
            .await
            .inspect_err(|e| debug!("{} {} failed: {}", method, url, e))?;

        if !response.is_success() {
            let message = error_message(&response.body);
            debug!("{} {} -> {}: {}", method, url, response.status, message);
            return Err(RegistroError::Request(message));
        }

        let value: Value = if response.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response.body)
                .map_err(|e| RegistroError::Request(format!("Invalid response body: {}", e)))?
        };
        serde_json::from_value(value)
            .map_err(|e| RegistroError::Request(format!("Unexpected response body: {}", e)))
    }
}

fn json_body<T: Serialize + ?Sized>(value: &T) -> Result<RequestBody> {
    Ok(RequestBody::Json(serde_json::to_string(value)?))
}

fn with_query(path: &str, filters: &Filters) -> String {
    if filters.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, filters.to_query())
    }
}

/// Server-provided `message` of an error body, or the fallback
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
}
