//! One-shot outcome messages shown on the next management page view

use medir_common::session::SessionToken;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Error, message: message.into() }
    }
}

/// Pending messages per management session
#[derive(Clone, Default)]
pub struct FlashStore {
    pending: Arc<RwLock<HashMap<SessionToken, Vec<Flash>>>>,
}

impl FlashStore {
    pub async fn push(&self, token: SessionToken, flash: Flash) {
        self.pending.write().await.entry(token).or_default().push(flash);
    }

    /// Remove and return the session's messages, oldest first
    pub async fn take(&self, token: &SessionToken) -> Vec<Flash> {
        self.pending.write().await.remove(token).unwrap_or_default()
    }

    pub async fn discard(&self, token: &SessionToken) {
        self.pending.write().await.remove(token);
    }

    pub async fn discard_all(&self, tokens: &[SessionToken]) {
        if tokens.is_empty() {
            return;
        }
        let mut pending = self.pending.write().await;
        for token in tokens {
            pending.remove(token);
        }
    }

    /// Number of sessions with undelivered messages
    pub async fn pending_sessions(&self) -> usize {
        self.pending.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> SessionToken {
        SessionToken::parse(&uuid::Uuid::new_v4().to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_take_drains_in_order() {
        let store = FlashStore::default();
        let session = token();

        store.push(session, Flash::success("first")).await;
        store.push(session, Flash::error("second")).await;

        assert_eq!(
            store.take(&session).await,
            vec![Flash::success("first"), Flash::error("second")]
        );
        assert!(store.take(&session).await.is_empty());
    }

    #[tokio::test]
    async fn test_sessions_isolated() {
        let store = FlashStore::default();
        let (a, b) = (token(), token());

        store.push(a, Flash::info("for a")).await;
        store.discard(&b).await;

        assert!(store.take(&b).await.is_empty());
        assert_eq!(store.take(&a).await.len(), 1);
    }

    #[tokio::test]
    async fn test_discard_all() {
        let store = FlashStore::default();
        let (a, b, c) = (token(), token(), token());

        for session in [a, b, c] {
            store.push(session, Flash::info("queued")).await;
        }
        store.discard_all(&[a, c]).await;

        assert_eq!(store.pending_sessions().await, 1);
        assert_eq!(store.take(&b).await.len(), 1);
    }
}
