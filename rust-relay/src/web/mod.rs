//! Web server module: routes, handlers and webhook signature checks.
//!
//! ```text
//! GET  /health                          liveness
//! GET  /                                event log + routes
//! GET  /facebook|/instagram|/threads    subscription handshake
//! POST /facebook|/instagram|/threads    webhook ingest
//! GET  /auth/login, /auth/callback      OAuth
//! GET  /profile, /insights              reports
//! ```

pub mod handlers;
pub mod signature;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use handlers::{
    auth_callback, auth_login, challenge, facebook_webhook, health, index, insights,
    instagram_webhook, profile, threads_webhook, Channel, ChallengeQuery,
};
pub use signature::{sign_payload, verify_hub_signature, SignatureAlgorithm};

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(index))
        .route("/facebook", get(challenge).post(facebook_webhook))
        .route("/instagram", get(challenge).post(instagram_webhook))
        .route("/threads", get(challenge).post(threads_webhook))
        .route("/auth/login", get(auth_login))
        .route("/auth/callback", get(auth_callback))
        .route("/profile", get(profile))
        .route("/insights", get(insights))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
