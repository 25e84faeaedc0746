//! Graph Relay - webhook receiver and OAuth relay for the Meta Graph API.
//!
//! - Receives and records webhooks from the facebook, instagram and threads
//!   channels (facebook deliveries are HMAC-verified)
//! - Runs the OAuth code exchange and long-lived token upgrade
//! - Serves profile and 7-day insights reports for the linked Instagram
//!   business account
//!
//! ## Architecture
//!
//! ```text
//! Webhook → Verifier → EventLog
//! Browser → OAuth → Graph API (x2) → Session
//! Report  → Account resolver → Graph API → caller
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod oauth;
pub mod state;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::ApiError;
pub use graph::{GraphApi, HttpGraphClient, UpstreamResult};
pub use state::{AppState, EventLog, Session};
pub use web::router;
