//! In-process publish/subscribe for authorization changes.

use talent_core::auth::{PermissionsChanged, TokenErrorKind};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Default channel capacity.
const CAPACITY: usize = 64;

/// A notification published by the session synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthNotification {
    /// The role registry of a session was recomputed.
    PermissionsChanged {
        subject: Option<String>,
        roles: Vec<String>,
    },
    /// The provider reported an error; no state changed.
    TokenError { kind: TokenErrorKind, reason: String },
}

impl From<PermissionsChanged> for AuthNotification {
    fn from(changed: PermissionsChanged) -> Self {
        Self::PermissionsChanged {
            subject: changed.subject,
            roles: changed
                .registry
                .role_labels()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Broadcast channel shared by every session.
#[derive(Clone)]
pub struct AuthEventBus {
    sender: broadcast::Sender<AuthNotification>,
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new(CAPACITY)
    }
}

impl AuthEventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthNotification> {
        self.sender.subscribe()
    }

    /// Publish to current subscribers. Returns how many received it; having
    /// none is not an error.
    pub fn publish(&self, notification: AuthNotification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }

    /// Spawn a subscriber that logs every notification until the bus closes.
    pub fn spawn_logger(&self) -> JoinHandle<()> {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(notification) => log_notification(&notification),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth notification logger lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

/// Token errors are already logged at WARN where they happen, so the bus
/// only traces them.
fn log_notification(notification: &AuthNotification) {
    match notification {
        AuthNotification::PermissionsChanged { subject, roles } => {
            tracing::info!(
                subject = subject.as_deref().unwrap_or("-"),
                roles = %roles.join(","),
                "Permissions changed"
            );
        }
        AuthNotification::TokenError { kind, reason } => {
            tracing::debug!(kind = kind.as_str(), %reason, "Token error notified");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use talent_core::auth::RoleRegistry;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = AuthEventBus::default();
        let mut rx = bus.subscribe();
        let delivered = bus.publish(AuthNotification::from(PermissionsChanged {
            subject: Some("u-1".into()),
            registry: RoleRegistry::from_claims(true, &["Manager"]),
        }));
        assert_eq!(delivered, 1);
        assert_eq!(
            rx.recv().await.unwrap(),
            AuthNotification::PermissionsChanged {
                subject: Some("u-1".into()),
                roles: vec!["Manager".into()],
            }
        );
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = AuthEventBus::default();
        assert_eq!(
            bus.publish(AuthNotification::TokenError {
                kind: TokenErrorKind::TokenError,
                reason: "x".into(),
            }),
            0
        );
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn captured_log(notification: &AuthNotification) -> String {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || log_notification(notification));
        let bytes = out.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_token_error_is_not_logged_twice_as_warning() {
        let log = captured_log(&AuthNotification::TokenError {
            kind: TokenErrorKind::TokenError,
            reason: "invalid_grant".into(),
        });
        assert!(log.contains("Token error notified"));
        assert!(log.contains("DEBUG"));
        assert!(!log.contains("WARN"));
    }
}
