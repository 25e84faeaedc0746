//! HTTP endpoint handlers.
//!
//! Webhook handlers only verify, record and acknowledge. OAuth and report
//! handlers delegate to [`crate::oauth`] and [`crate::graph`].

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::graph::{fetch_insights, fetch_profile, resolve_account, unix_now};
use crate::oauth::{self, UpgradeOutcome, NEXT_ROUTES};
use crate::state::{AppState, WebhookEvent};
use crate::web::signature::verify_hub_signature;

// =============================================================================
// Status
// =============================================================================

pub async fn health() -> &'static str {
    "ok"
}

/// Status page: the event log (newest first) and the useful routes.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let events = state.events.snapshot().await;
    let pretty = serde_json::to_string_pretty(&events).unwrap_or_else(|_| "[]".to_string());

    Html(format!(
        "<pre>\nWebhook updates (last {}):\n{}\n\nUseful routes:\n- GET /auth/login\n- GET /profile\n- GET /insights\n</pre>",
        events.len(),
        escape_html(&pretty)
    ))
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// =============================================================================
// Webhook subscription handshake
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Subscription handshake shared by all three channel paths.
///
/// Echoes `hub.challenge` verbatim when the mode is `subscribe` and the
/// verify token matches; anything else is a 400.
pub async fn challenge(
    State(state): State<AppState>,
    Query(query): Query<ChallengeQuery>,
) -> Response {
    let subscribing = query.mode.as_deref() == Some("subscribe");
    let token_matches = query.verify_token.as_deref() == Some(state.config.verify_token.as_str());

    if subscribing && token_matches {
        info!("webhook_challenge_accepted");
        return (StatusCode::OK, query.challenge.unwrap_or_default()).into_response();
    }

    warn!(
        mode = ?query.mode,
        token_matches = token_matches,
        "webhook_challenge_rejected"
    );
    (StatusCode::BAD_REQUEST, "Bad Request").into_response()
}

// =============================================================================
// Webhook ingest
// =============================================================================

/// Inbound webhook channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Facebook,
    Instagram,
    Threads,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Facebook => "facebook",
            Channel::Instagram => "instagram",
            Channel::Threads => "threads",
        }
    }

    /// Facebook deliveries are always verified; the other channels only
    /// when `VERIFY_ALL_CHANNELS` is set.
    fn requires_signature(self, verify_all_channels: bool) -> bool {
        self == Channel::Facebook || verify_all_channels
    }
}

pub async fn facebook_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    ingest(&state, Channel::Facebook, &headers, &body).await
}

pub async fn instagram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    ingest(&state, Channel::Instagram, &headers, &body).await
}

pub async fn threads_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    ingest(&state, Channel::Threads, &headers, &body).await
}

/// Verify (when required), parse and record one delivery.
async fn ingest(
    state: &AppState,
    channel: Channel,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(StatusCode, &'static str), ApiError> {
    info!(
        channel = channel.as_str(),
        body_length = body.len(),
        "webhook_received"
    );

    if channel.requires_signature(state.config.verify_all_channels) {
        let algorithm = state.config.signature_algorithm;
        let signature = headers
            .get(algorithm.header_name())
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let secret = state.config.app_secret.as_deref().unwrap_or("");

        if !verify_hub_signature(secret, algorithm, body, signature) {
            warn!(
                channel = channel.as_str(),
                header = algorithm.header_name(),
                has_signature = !signature.is_empty(),
                secret_configured = !secret.is_empty(),
                "webhook_signature_invalid"
            );
            return Err(ApiError::InvalidSignature);
        }

        info!(channel = channel.as_str(), "webhook_signature_valid");
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let event = parse_event(content_type, body).map_err(|e| {
        warn!(channel = channel.as_str(), error = %e, "webhook_payload_invalid");
        ApiError::InvalidPayload(format!("invalid JSON webhook body: {e}"))
    })?;

    state.events.record(event).await;
    info!(channel = channel.as_str(), "webhook_recorded");

    Ok((StatusCode::OK, "OK"))
}

/// Only JSON content types are parsed; any other body, and an empty JSON
/// body, is recorded as an empty object. JSON bodies must be an object or
/// an array.
fn parse_event(content_type: Option<&str>, body: &[u8]) -> Result<WebhookEvent, String> {
    if !content_type.is_some_and(is_json_content_type)
        || body.iter().all(u8::is_ascii_whitespace)
    {
        return Ok(WebhookEvent::Object(Map::new()));
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(v @ (Value::Object(_) | Value::Array(_))) => Ok(v),
        Ok(_) => Err("top-level value must be an object or array".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// `application/json` or any `application/*+json`, ignoring parameters.
fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

// =============================================================================
// OAuth
// =============================================================================

pub async fn auth_login(State(state): State<AppState>) -> Result<Response, ApiError> {
    let url = oauth::authorization_url(&state.config).map_err(|e| {
        warn!(error = %e, "oauth_login_not_configured");
        e
    })?;

    info!("oauth_login_redirect");
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

pub async fn auth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<Value>, ApiError> {
    let outcome = oauth::complete_login(
        state.graph.as_ref(),
        &state.config,
        &state.session,
        query.code.as_deref(),
    )
    .await?;

    info!(
        upgraded = matches!(outcome, UpgradeOutcome::Upgraded),
        "oauth_login_complete"
    );

    Ok(Json(json!({
        "ok": true,
        "message": "Login complete",
        "next": NEXT_ROUTES,
    })))
}

// =============================================================================
// Reports
// =============================================================================

pub async fn profile(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let token = state.session.token().await.ok_or(ApiError::Unauthenticated)?;
    let base = state.config.graph_api_base.as_str();
    let graph = state.graph.as_ref();

    let ig_user_id = resolve_account(graph, base, &token).await?;
    let profile = fetch_profile(graph, base, &token, &ig_user_id).await?;

    Ok(Json(json!({
        "ok": true,
        "ig_user_id": ig_user_id,
        "profile": profile,
    })))
}

pub async fn insights(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let token = state.session.token().await.ok_or(ApiError::Unauthenticated)?;
    let base = state.config.graph_api_base.as_str();
    let graph = state.graph.as_ref();

    let ig_user_id = resolve_account(graph, base, &token).await?;
    let insights = fetch_insights(graph, base, &token, &ig_user_id, unix_now()).await?;

    Ok(Json(json!({
        "ok": true,
        "ig_user_id": ig_user_id,
        "insights_7d": insights,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: Option<&str> = Some("application/json");

    #[test]
    fn test_parse_event_empty_body() {
        assert_eq!(parse_event(JSON, b"").unwrap(), json!({}));
        assert_eq!(parse_event(JSON, b" \n").unwrap(), json!({}));
    }

    #[test]
    fn test_parse_event_accepts_objects_and_arrays() {
        assert_eq!(parse_event(JSON, br#"{"a":1}"#).unwrap(), json!({ "a": 1 }));
        assert_eq!(parse_event(JSON, b"[1,2]").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_parse_event_rejects_malformed_json() {
        assert!(parse_event(JSON, b"{not json").is_err());
        assert!(parse_event(JSON, b"42").is_err());
    }

    #[test]
    fn test_parse_event_ignores_non_json_bodies() {
        assert_eq!(parse_event(Some("text/plain"), b"hello").unwrap(), json!({}));
        assert_eq!(parse_event(None, b"{not json").unwrap(), json!({}));
    }

    #[test]
    fn test_is_json_content_type() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("Application/JSON; charset=utf-8"));
        assert!(is_json_content_type("application/vnd.api+json"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type("application/x-www-form-urlencoded"));
    }

    #[test]
    fn test_requires_signature() {
        assert!(Channel::Facebook.requires_signature(false));
        assert!(!Channel::Instagram.requires_signature(false));
        assert!(!Channel::Threads.requires_signature(false));
        assert!(Channel::Threads.requires_signature(true));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a & b>"), "&lt;a &amp; b&gt;");
    }
}
