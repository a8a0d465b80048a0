//! Session Gate: shared-password authentication for the management pages
//!
//! One password, configured at startup, unlocks every mutation. A successful
//! login issues a random session token valid for a fixed timeout. There are
//! no user accounts, no rate limiting and no lockout: anyone holding the
//! shared password has full management access.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Credential and lifetime settings injected at startup
#[derive(Clone)]
pub struct SessionConfig {
    pub password: String,
    pub timeout: Duration,
    /// Extend a session on every successful check instead of only at login
    pub renew_on_use: bool,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("renew_on_use", &self.renew_on_use)
            .finish()
    }
}

/// Opaque session identifier carried in the session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a token from its cookie value
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues and validates session tokens
pub struct SessionGate {
    password_digest: Vec<u8>,
    timeout: Duration,
    renew_on_use: bool,
    sessions: RwLock<HashMap<SessionToken, Instant>>,
}

impl SessionGate {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            password_digest: digest(&config.password),
            timeout: config.timeout,
            renew_on_use: config.renew_on_use,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Compare a candidate against the shared password
    pub fn check_password(&self, candidate: &str) -> bool {
        digest(candidate) == self.password_digest
    }

    /// Start a session if the password matches
    pub async fn authenticate(&self, password: &str) -> Option<SessionToken> {
        if !self.check_password(password) {
            warn!("Rejected management login: incorrect password");
            return None;
        }

        let token = SessionToken::generate();
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, expires_at| *expires_at > now);
        sessions.insert(token, now + self.timeout);

        info!("Management session started (expires in {:?})", self.timeout);
        Some(token)
    }

    /// True while the token's session has not expired
    ///
    /// Expired sessions are forgotten on first sight.
    pub async fn is_authenticated(&self, token: &SessionToken) -> bool {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(token) {
            Some(expires_at) if *expires_at > now => {
                if self.renew_on_use {
                    *expires_at = now + self.timeout;
                }
                true
            }
            Some(_) => {
                sessions.remove(token);
                debug!("Management session expired");
                false
            }
            None => false,
        }
    }

    /// Forget every expired session and return their tokens
    pub async fn purge_expired(&self) -> Vec<SessionToken> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let expired: Vec<SessionToken> = sessions
            .iter()
            .filter(|(_, expires_at)| **expires_at <= now)
            .map(|(token, _)| *token)
            .collect();
        for token in &expired {
            sessions.remove(token);
        }

        if !expired.is_empty() {
            debug!("Purged {} expired management session(s)", expired.len());
        }
        expired
    }

    /// End a session
    pub async fn revoke(&self, token: &SessionToken) {
        if self.sessions.write().await.remove(token).is_some() {
            info!("Management session ended");
        }
    }

    /// Number of sessions that have not expired
    pub async fn active_sessions(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|expires_at| **expires_at > now)
            .count()
    }
}

fn digest(value: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.finalize().to_vec()
}
