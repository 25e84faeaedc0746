//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup; there is no hot reload.

use std::env;
use tracing::warn;

use crate::web::signature::SignatureAlgorithm;

/// Default Graph API base (versioned).
pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";

/// Default OAuth authorization dialog.
pub const DEFAULT_OAUTH_DIALOG_URL: &str = "https://www.facebook.com/v19.0/dialog/oauth";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared app secret: webhook HMAC key and OAuth client secret
    pub app_secret: Option<String>,

    /// Token expected in `hub.verify_token` during the subscription handshake
    pub verify_token: String,

    /// OAuth client id
    pub app_id: Option<String>,

    /// OAuth callback URL registered with the provider
    pub redirect_uri: String,

    /// Graph API base URL, without trailing slash
    pub graph_api_base: String,

    /// OAuth authorization dialog URL
    pub oauth_dialog_url: String,

    /// HMAC algorithm used for `X-Hub-Signature` verification
    pub signature_algorithm: SignatureAlgorithm,

    /// Verify signatures on every channel, not only `/facebook`
    pub verify_all_channels: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let port = parse_port("PORT", 5000);

        let redirect_uri = non_empty("REDIRECT_URI")
            .unwrap_or_else(|| format!("http://localhost:{}/auth/callback", port));

        let signature_algorithm = match env::var("WEBHOOK_SIGNATURE_ALGORITHM") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(
                    env_var = "WEBHOOK_SIGNATURE_ALGORITHM",
                    value = %raw,
                    "Invalid signature algorithm, using default"
                );
                SignatureAlgorithm::default()
            }),
            Err(_) => SignatureAlgorithm::default(),
        };

        Config {
            port,
            app_secret: non_empty("APP_SECRET"),
            verify_token: non_empty("TOKEN").unwrap_or_else(|| "token".to_string()),
            app_id: non_empty("APP_ID"),
            redirect_uri,
            graph_api_base: non_empty("GRAPH_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GRAPH_API_BASE.to_string()),
            oauth_dialog_url: non_empty("OAUTH_DIALOG_URL")
                .unwrap_or_else(|| DEFAULT_OAUTH_DIALOG_URL.to_string()),
            signature_algorithm,
            verify_all_channels: parse_bool("VERIFY_ALL_CHANNELS", false),
        }
    }

    /// Both OAuth app credentials, if configured.
    pub fn app_credentials(&self) -> Option<(&str, &str)> {
        match (self.app_id.as_deref(), self.app_secret.as_deref()) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 5000,
            app_secret: None,
            verify_token: "token".to_string(),
            app_id: None,
            redirect_uri: "http://localhost:5000/auth/callback".to_string(),
            graph_api_base: DEFAULT_GRAPH_API_BASE.to_string(),
            oauth_dialog_url: DEFAULT_OAUTH_DIALOG_URL.to_string(),
            signature_algorithm: SignatureAlgorithm::default(),
            verify_all_channels: false,
        }
    }
}

/// Read a variable, treating an empty or blank value as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Parse a TCP port, falling back to `default` on a missing or invalid value.
fn parse_port(name: &str, default: u16) -> u16 {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<u16>() {
        Ok(port) => port,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid port, using default");
            default
        }
    }
}

/// Parse a boolean flag such as "true", "1" or "yes".
fn parse_bool(name: &str, default: bool) -> bool {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" | "" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid boolean, using default");
            default
        }
    }
}
