//! Loopback tests for the reqwest transport and tokio-tungstenite connector
//!
//! Each test starts a throwaway server on an ephemeral port and points a
//! real ApiClient at it.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::SinkExt;
use registro_client::{
    ApiClient, ClientEvent, Config, Filters, MemoryStorage, NewReport, RegistroError, Storage,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config_for(base: &str) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("{}/api", base);
    config.api.ws_url = base.replace("http://", "ws://");
    config.api.timeout_ms = 2_000;
    config
}

fn header(headers: &HeaderMap, name: &str) -> Value {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| Value::String(v.to_string()))
        .unwrap_or(Value::Null)
}

#[tokio::test]
async fn test_headers_reach_the_server() {
    let router = Router::new().route(
        "/api/users",
        get(|headers: HeaderMap| async move {
            Json(json!([{
                "id": 1,
                "nombre": header(&headers, "authorization"),
                "apellido": header(&headers, "content-type"),
            }]))
        }),
    );
    let base = serve(router).await;
    let storage = Arc::new(MemoryStorage::new());
    storage.set("token", "abc").unwrap();
    let client = ApiClient::new(&config_for(&base), storage).unwrap();

    let users = client.get_users(&Filters::new()).await.unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].nombre, "Bearer abc");
    assert_eq!(users[0].apellido, "application/json");
}

#[tokio::test]
async fn test_report_is_sent_as_multipart() {
    let router = Router::new().route(
        "/api/reports",
        post(|headers: HeaderMap| async move {
            let content_type = header(&headers, "content-type");
            let is_multipart = content_type
                .as_str()
                .is_some_and(|ct| ct.starts_with("multipart/form-data; boundary="));
            let description = if is_multipart { "multipart" } else { "other" };
            Json(json!({"id": 1, "type": "emergency", "description": description}))
        }),
    );
    let base = serve(router).await;
    let client = ApiClient::new(&config_for(&base), Arc::new(MemoryStorage::new())).unwrap();

    let report = client
        .create_report(&NewReport::emergency("Corte de luz"))
        .await
        .unwrap();

    assert_eq!(report.description, "multipart");
}

#[tokio::test]
async fn test_error_status_message_is_surfaced() {
    let router = Router::new().route(
        "/api/messages",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Token inválido"})),
            )
        }),
    );
    let base = serve(router).await;
    let client = ApiClient::new(&config_for(&base), Arc::new(MemoryStorage::new())).unwrap();

    let err = client.get_messages().await.unwrap_err();
    assert!(matches!(err, RegistroError::Request(ref m) if m == "Token inválido"));
}

#[tokio::test]
async fn test_unreachable_server_is_request_error() {
    let mut config = Config::default();
    config.api.base_url = "http://127.0.0.1:1/api".to_string();
    let client = ApiClient::new(&config, Arc::new(MemoryStorage::new())).unwrap();

    let err = client.get_messages().await.unwrap_err();
    assert!(matches!(err, RegistroError::Request(_)));
}

#[tokio::test]
async fn test_websocket_messages_are_published() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(WsMessage::text(r#"{"type":"nuevo_registro","id":1}"#))
            .await
            .unwrap();
        // Keep the socket open until the client hangs up
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let mut config = config_for(&format!("http://{}", addr));
    config.reconnect.enabled = false;
    let client = ApiClient::new(&config, Arc::new(MemoryStorage::new())).unwrap();
    let mut events = client.subscribe();

    client.connect_websocket().await.unwrap();

    let message = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let ClientEvent::Message(value) = events.recv().await.unwrap() {
                return value;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(message, json!({"type": "nuevo_registro", "id": 1}));

    client.disconnect_websocket().await;
    assert!(!client.is_websocket_connected().await);
}
