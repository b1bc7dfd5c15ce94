//! One-shot notifications queued in the session and shown on the next page.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

/// Queue a toast. A session store failure only loses the toast.
pub async fn push(session: &Session, kind: ToastKind, message: impl Into<String>) {
    let message = message.into();
    let mut queue: Vec<Toast> = session
        .get(session_keys::TOASTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    queue.push(Toast { kind, message });
    if let Err(e) = session.insert(session_keys::TOASTS, &queue).await {
        tracing::warn!(error = %e, "Failed to queue toast");
    }
}

pub async fn success(session: &Session, message: impl Into<String>) {
    push(session, ToastKind::Success, message).await;
}

pub async fn error(session: &Session, message: impl Into<String>) {
    push(session, ToastKind::Error, message).await;
}

/// Remove and return every queued toast.
pub async fn take(session: &Session) -> Vec<Toast> {
    session
        .remove::<Vec<Toast>>(session_keys::TOASTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    #[tokio::test]
    async fn test_toasts_are_shown_once_in_order() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        success(&session, "Employee created successfully").await;
        error(&session, "Error loading departments").await;

        let toasts = take(&session).await;
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].kind, ToastKind::Success);
        assert_eq!(toasts[1].message, "Error loading departments");
        assert!(take(&session).await.is_empty());
    }
}
