//! Admin panel: password gate, registration statistics and periodic refresh

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::config::AdminConfig;
use crate::error::Result;
use crate::models::{Filters, User};
use crate::notification::{Notification, NotificationSink};

const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(1);

/// Cosmetic password check in front of the admin panel
///
/// This only hides the panel; the backend enforces access with the
/// session token.
#[derive(Debug, Clone)]
pub struct AdminGate {
    password: Option<String>,
}

impl AdminGate {
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            password: config.password.clone(),
        }
    }

    /// Check an entered password and notify the outcome
    pub fn unlock(&self, attempt: &str, sink: &dyn NotificationSink) -> bool {
        let granted = self
            .password
            .as_deref()
            .is_some_and(|expected| !expected.is_empty() && expected == attempt);
        if granted {
            sink.notify(Notification::success("✅ Acceso concedido"));
        } else {
            sink.notify(Notification::error("❌ Contraseña incorrecta"));
        }
        granted
    }
}

/// Counters shown at the top of the admin panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub total: usize,
    pub with_photo: usize,
    pub today: usize,
}

impl AdminStats {
    /// Count registrations; `today` uses each record's local creation date
    pub fn from_users(users: &[User], today: NaiveDate) -> Self {
        Self {
            total: users.len(),
            with_photo: users.iter().filter(|u| u.has_photo()).count(),
            today: users
                .iter()
                .filter(|u| created_on(u) == Some(today))
                .count(),
        }
    }
}

fn created_on(user: &User) -> Option<NaiveDate> {
    let raw = user.created_at.as_deref()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Local).date_naive())
}

/// Fetch all registrations and the stats derived from them
pub async fn load_admin_panel(client: &ApiClient) -> Result<(AdminStats, Vec<User>)> {
    let users = client.get_users(&Filters::new()).await?;
    let stats = AdminStats::from_users(&users, Local::now().date_naive());
    debug!(
        "Admin panel: {} registrations, {} with photo, {} today",
        stats.total, stats.with_photo, stats.today
    );
    Ok((stats, users))
}

/// Refresh admin stats every `interval` while a session is active
///
/// Ticks without a token are skipped. Returns when `cancel` fires. A zero
/// interval is raised to one millisecond.
pub async fn run_stats_refresh<F>(
    client: Arc<ApiClient>,
    interval: Duration,
    cancel: CancellationToken,
    mut publish: F,
) where
    F: FnMut(AdminStats) + Send,
{
    let mut ticker = tokio::time::interval(interval.max(MIN_REFRESH_INTERVAL));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Stats refresh stopped");
                return;
            }
            _ = ticker.tick() => {
                if !client.is_authenticated().await {
                    continue;
                }
                match load_admin_panel(&client).await {
                    Ok((stats, _)) => publish(stats),
                    Err(e) => warn!("Stats refresh failed: {}", e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, ReconnectConfig};
    use crate::io::{HttpResponse, MockHttpTransport, MockSocketConnector};
    use crate::notification::{MockNotificationSink, NotificationKind};
    use crate::storage::{MemoryStorage, Storage, TOKEN_KEY};
    use std::sync::Mutex as StdMutex;
    use tokio_test::{assert_pending, assert_ready};

    fn user(json: &str) -> User {
        serde_json::from_str(json).unwrap()
    }

    fn local_date(rfc3339: &str) -> NaiveDate {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Local)
            .date_naive()
    }

    #[test]
    fn gate_accepts_configured_password() {
        let gate = AdminGate::new(&AdminConfig {
            password: Some("s3creto".to_string()),
            ..Default::default()
        });
        let mut sink = MockNotificationSink::new();
        sink.expect_notify()
            .withf(|n| n.kind == NotificationKind::Success)
            .times(1)
            .return_const(());

        assert!(gate.unlock("s3creto", &sink));
    }

    #[test]
    fn gate_rejects_wrong_password() {
        let gate = AdminGate::new(&AdminConfig {
            password: Some("s3creto".to_string()),
            ..Default::default()
        });
        let mut sink = MockNotificationSink::new();
        sink.expect_notify()
            .withf(|n| n.kind == NotificationKind::Error && n.message.contains("incorrecta"))
            .times(1)
            .return_const(());

        assert!(!gate.unlock("nope", &sink));
    }

    #[test]
    fn gate_without_password_stays_locked() {
        let gate = AdminGate::new(&AdminConfig::default());
        let mut sink = MockNotificationSink::new();
        sink.expect_notify().times(1).return_const(());

        assert!(!gate.unlock("", &sink));
    }

    #[test]
    fn stats_count_photos_and_today() {
        let today_ts = "2026-10-16T12:00:00Z";
        let users = vec![
            user(r#"{"id":1,"fotoUrl":"data:image/png;base64,AA==","createdAt":"2026-10-16T12:00:00Z"}"#),
            user(r#"{"id":2,"createdAt":"2026-10-16T12:00:00Z"}"#),
            user(r#"{"id":3,"fotoUrl":"data:x","createdAt":"2025-01-01T12:00:00Z"}"#),
            user(r#"{"id":4,"createdAt":"garbage"}"#),
            user(r#"{"id":5}"#),
        ];

        let stats = AdminStats::from_users(&users, local_date(today_ts));
        assert_eq!(
            stats,
            AdminStats {
                total: 5,
                with_photo: 2,
                today: 2,
            }
        );
    }

    #[test]
    fn stats_of_empty_list() {
        let stats = AdminStats::from_users(&[], local_date("2026-10-16T12:00:00Z"));
        assert_eq!(stats, AdminStats::default());
    }

    fn client_with(transport: MockHttpTransport, token: Option<&str>) -> Arc<ApiClient> {
        let storage = Arc::new(MemoryStorage::new());
        if let Some(token) = token {
            storage.set(TOKEN_KEY, token).unwrap();
        }
        Arc::new(ApiClient::with_io(
            ApiConfig::default(),
            ReconnectConfig::default(),
            Arc::new(transport),
            Arc::new(MockSocketConnector::new()),
            storage,
        ))
    }

    #[tokio::test]
    async fn stats_refresh_skips_without_session_and_stops_on_cancel() {
        let client = client_with(MockHttpTransport::new(), None);
        let cancel = CancellationToken::new();
        let mut task = tokio_test::task::spawn(run_stats_refresh(
            client,
            Duration::from_secs(60),
            cancel.clone(),
            |_| panic!("no stats without a session"),
        ));

        assert_pending!(task.poll());
        cancel.cancel();
        assert_ready!(task.poll());
    }

    #[tokio::test]
    async fn stats_refresh_accepts_zero_interval() {
        let client = client_with(MockHttpTransport::new(), None);
        let cancel = CancellationToken::new();
        let mut task = tokio_test::task::spawn(run_stats_refresh(
            client,
            Duration::ZERO,
            cancel.clone(),
            |_| {},
        ));

        assert_pending!(task.poll());
        cancel.cancel();
        assert_ready!(task.poll());
    }

    #[tokio::test]
    async fn stats_refresh_publishes_with_session() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.url.ends_with("/users"))
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(HttpResponse {
                        status: 200,
                        body: r#"[{"id":1,"fotoUrl":"data:x"},{"id":2}]"#.to_string(),
                    })
                })
            });
        let client = client_with(transport, Some("abc"));
        let published = Arc::new(StdMutex::new(Vec::new()));
        let sink = published.clone();
        let cancel = CancellationToken::new();
        let mut task = tokio_test::task::spawn(run_stats_refresh(
            client,
            Duration::from_secs(60),
            cancel.clone(),
            move |stats| sink.lock().unwrap().push(stats),
        ));

        assert_pending!(task.poll());
        cancel.cancel();
        assert_ready!(task.poll());

        let published = published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].total, 2);
        assert_eq!(published[0].with_photo, 1);
    }
}
