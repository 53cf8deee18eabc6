//! Registro Client Library
//!
//! Client for the civic registration backend: authenticated HTTP calls for
//! users, reports and chat messages, a reconnecting WebSocket for server
//! notifications, and the fixed electoral reference data the registration
//! form is built from.

pub mod actions;
pub mod admin;
pub mod client;
pub mod config;
mod connection;
pub mod error;
pub mod events;
pub mod io;
pub mod models;
pub mod notification;
pub mod schools;
pub mod sections;
pub mod storage;

pub use actions::{
    send_chat_message, send_emergency, submit_registration, Photo, RegistrationOutcome,
};
pub use admin::{load_admin_panel, run_stats_refresh, AdminGate, AdminStats};
pub use client::ApiClient;
pub use config::{load_config, AdminConfig, ApiConfig, Config, ReconnectConfig, StorageConfig};
pub use error::{RegistroError, Result};
pub use events::ClientEvent;
pub use models::{
    Attachment, Filters, LoginResponse, Message, NewMessage, NewReport, NewUser, RecordId, Report,
    User,
};
pub use notification::{LogSink, Notification, NotificationKind, NotificationSink};
pub use schools::{schools_in, School, SCHOOLS};
pub use sections::{all_municipalities, section, section_of, Section, SECTIONS};
pub use storage::{bootstrap_storage, FileStorage, MemoryStorage, Storage};
