//! OAuth login flow.
//!
//! ```text
//! Unauthenticated → login (302) → callback: code → short-lived → long-lived
//! ```
//!
//! The short-lived token is stored as soon as the code exchange succeeds. The
//! upgrade to a long-lived token is best effort: when it fails the short-lived
//! token stays in the session and login still succeeds.

use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::graph::{build_url, GraphApi, UpstreamFailure, UpstreamResult};
use crate::state::{Credential, Session, TokenTier};

/// Permissions requested in the authorization dialog.
pub const SCOPES: &[&str] = &[
    "instagram_basic",
    "instagram_manage_insights",
    "pages_show_list",
    "pages_read_engagement",
];

/// Routes that become usable once logged in.
pub const NEXT_ROUTES: &[&str] = &["/profile", "/insights"];

/// Result of the long-lived token upgrade.
#[derive(Debug, Clone, PartialEq)]
pub enum UpgradeOutcome {
    Upgraded,
    KeptShortLived(UpstreamFailure),
}

/// Authorization dialog URL to redirect the browser to.
pub fn authorization_url(config: &Config) -> Result<String, ApiError> {
    let (app_id, _) = config
        .app_credentials()
        .ok_or_else(|| ApiError::Config("APP_ID/APP_SECRET are not set".to_string()))?;

    let scope = SCOPES.join(",");

    build_url(
        &config.oauth_dialog_url,
        &[
            ("client_id", Some(app_id)),
            ("redirect_uri", Some(config.redirect_uri.as_str())),
            ("scope", Some(scope.as_str())),
            ("response_type", Some("code")),
        ],
    )
    .map_err(|e| ApiError::Config(format!("invalid OAUTH_DIALOG_URL: {e}")))
}

/// Handle the OAuth callback: exchange `code`, store the token, try to upgrade.
pub async fn complete_login(
    api: &dyn GraphApi,
    config: &Config,
    session: &Session,
    code: Option<&str>,
) -> Result<UpgradeOutcome, ApiError> {
    let code = code.filter(|c| !c.is_empty()).ok_or(ApiError::MissingCode)?;
    let token_url = format!("{}/oauth/access_token", config.graph_api_base);

    let short_lived = exchange(
        api,
        &token_url,
        &[
            ("client_id", config.app_id.as_deref()),
            ("client_secret", config.app_secret.as_deref()),
            ("redirect_uri", Some(config.redirect_uri.as_str())),
            ("code", Some(code)),
        ],
    )
    .await
    .map_err(|failure| {
        warn!(status_code = ?failure.status, "oauth_code_exchange_failed");
        ApiError::Upstream(failure)
    })?;

    session
        .replace(Credential {
            token: short_lived.clone(),
            tier: TokenTier::ShortLived,
        })
        .await;
    info!(tier = TokenTier::ShortLived.as_str(), "oauth_token_stored");

    let upgrade = exchange(
        api,
        &token_url,
        &[
            ("grant_type", Some("fb_exchange_token")),
            ("client_id", config.app_id.as_deref()),
            ("client_secret", config.app_secret.as_deref()),
            ("fb_exchange_token", Some(short_lived.as_str())),
        ],
    )
    .await;

    match upgrade {
        Ok(long_lived) => {
            session
                .replace(Credential {
                    token: long_lived,
                    tier: TokenTier::LongLived,
                })
                .await;
            info!(tier = TokenTier::LongLived.as_str(), "oauth_token_stored");
            Ok(UpgradeOutcome::Upgraded)
        }
        Err(failure) => {
            warn!(status_code = ?failure.status, "oauth_token_upgrade_failed");
            Ok(UpgradeOutcome::KeptShortLived(failure))
        }
    }
}

/// One call to the token endpoint. A 2xx body without a string
/// `access_token` counts as a failure.
async fn exchange(
    api: &dyn GraphApi,
    token_url: &str,
    params: &[(&str, Option<&str>)],
) -> Result<String, UpstreamFailure> {
    match api.get(token_url, params).await {
        UpstreamResult::Success { status, data } => {
            match data.get("access_token").and_then(Value::as_str) {
                Some(token) if !token.is_empty() => Ok(token.to_string()),
                _ => Err(UpstreamFailure {
                    status: Some(status),
                    data,
                }),
            }
        }
        UpstreamResult::Failure(failure) => Err(failure),
    }
}
