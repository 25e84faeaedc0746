//! Process-wide state shared by every request handler.
//!
//! Exactly two values are mutable: the webhook [`EventLog`] and the OAuth
//! [`Session`]. Both are built once at startup and handed to handlers through
//! [`AppState`]. Each mutation takes the write lock once and never across an
//! upstream call.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::graph::GraphApi;

/// A webhook body exactly as the provider sent it (a JSON object or array).
pub type WebhookEvent = Value;

/// Newest-first, unbounded log of accepted webhook events.
#[derive(Clone, Default)]
pub struct EventLog {
    inner: Arc<RwLock<VecDeque<WebhookEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend an event; it becomes index 0.
    pub async fn record(&self, event: WebhookEvent) {
        self.inner.write().await.push_front(event);
    }

    pub async fn snapshot(&self) -> Vec<WebhookEvent> {
        self.inner.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// Lifetime tier of the stored user token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTier {
    ShortLived,
    LongLived,
}

impl TokenTier {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenTier::ShortLived => "short_lived",
            TokenTier::LongLived => "long_lived",
        }
    }
}

/// The current user's bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub tier: TokenTier,
}

// Keep tokens out of Debug output.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("tier", &self.tier)
            .finish()
    }
}

/// Holder of the single process-wide credential. Last write wins.
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<Option<Credential>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace(&self, credential: Credential) {
        *self.inner.write().await = Some(credential);
    }

    pub async fn current(&self) -> Option<Credential> {
        self.inner.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.as_ref().map(|c| c.token.clone())
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub graph: Arc<dyn GraphApi>,
    pub events: EventLog,
    pub session: Session,
}

impl AppState {
    pub fn new(config: Config, graph: Arc<dyn GraphApi>) -> Self {
        Self {
            config: Arc::new(config),
            graph,
            events: EventLog::new(),
            session: Session::new(),
        }
    }
}
