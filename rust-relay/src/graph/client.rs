//! Graph API HTTP client.
//!
//! Every call is a single GET whose outcome is normalized into an
//! [`UpstreamResult`]. The Graph API reports logical errors inside 200
//! responses, so a call only succeeds when the status is 2xx AND the body
//! carries no `error` member.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use url::Url;

/// Query parameters for a Graph call. `None` values are left out of the URL.
pub type Params<'a> = [(&'a str, Option<&'a str>)];

/// Outcome of one upstream call.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamResult {
    Success { status: u16, data: Value },
    Failure(UpstreamFailure),
}

/// A failed upstream call, passed through to the caller verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamFailure {
    /// HTTP status, absent when no response was received at all
    pub status: Option<u16>,
    /// Parsed response body, or a synthetic `{"error": {...}}` for transport errors
    pub data: Value,
}

impl UpstreamResult {
    /// Classify a received response.
    pub fn classify(status: u16, data: Value) -> Self {
        let http_ok = (200..300).contains(&status);
        let has_error = data.get("error").is_some_and(|e| !e.is_null());

        if http_ok && !has_error {
            UpstreamResult::Success { status, data }
        } else {
            UpstreamResult::Failure(UpstreamFailure {
                status: Some(status),
                data,
            })
        }
    }

    /// A call that never produced an HTTP response.
    pub fn transport_error(message: impl Into<String>) -> Self {
        UpstreamResult::Failure(UpstreamFailure {
            status: None,
            data: json!({ "error": { "message": message.into() } }),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UpstreamResult::Success { .. })
    }

    /// Body on success, the failure otherwise.
    pub fn into_result(self) -> Result<Value, UpstreamFailure> {
        match self {
            UpstreamResult::Success { data, .. } => Ok(data),
            UpstreamResult::Failure(failure) => Err(failure),
        }
    }

    /// Wire shape: `{"ok": bool, "status": u16|null, "data": ...}`.
    pub fn to_json(&self) -> Value {
        match self {
            UpstreamResult::Success { status, data } => {
                json!({ "ok": true, "status": status, "data": data })
            }
            UpstreamResult::Failure(failure) => failure.to_json(),
        }
    }
}

impl UpstreamFailure {
    pub fn to_json(&self) -> Value {
        json!({ "ok": false, "status": self.status, "data": self.data })
    }
}

/// Append all present params to `base` as query parameters.
pub fn build_url(base: &str, params: &Params<'_>) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;

    let present: Vec<(&str, &str)> = params
        .iter()
        .filter_map(|(k, v)| v.map(|v| (*k, v)))
        .collect();

    // query_pairs_mut() would leave a dangling '?' when nothing is appended
    if !present.is_empty() {
        url.query_pairs_mut().extend_pairs(present);
    }

    Ok(url.into())
}

/// `err` followed by each of its sources, joined with ": ".
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Read-only access to the Graph API.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Issue one GET against `base_url` with `params` appended.
    async fn get(&self, base_url: &str, params: &Params<'_>) -> UpstreamResult;
}

/// [`GraphApi`] backed by a shared `reqwest` client.
#[derive(Clone, Default)]
pub struct HttpGraphClient {
    client: Client,
}

impl HttpGraphClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GraphApi for HttpGraphClient {
    async fn get(&self, base_url: &str, params: &Params<'_>) -> UpstreamResult {
        let url = match build_url(base_url, params) {
            Ok(u) => u,
            Err(e) => {
                warn!(base_url = base_url, error = %e, "graph_get_invalid_url");
                return UpstreamResult::transport_error(format!("invalid url: {e}"));
            }
        };

        // The query string holds access tokens; only the base is logged.
        info!(base_url = base_url, "graph_get_start");

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    base_url = base_url,
                    is_timeout = e.is_timeout(),
                    is_connect = e.is_connect(),
                    "graph_get_failed"
                );
                return UpstreamResult::transport_error(error_chain(&e.without_url()));
            }
        };

        let status = response.status().as_u16();
        let data = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes).unwrap_or_else(|e| {
                warn!(
                    base_url = base_url,
                    status_code = status,
                    error = %e,
                    "graph_get_unparseable_body"
                );
                Value::Object(Map::new())
            }),
            Err(e) => {
                warn!(base_url = base_url, error = %e, "graph_get_body_read_failed");
                Value::Object(Map::new())
            }
        };

        let result = UpstreamResult::classify(status, data);

        info!(
            base_url = base_url,
            status_code = status,
            is_success = result.is_success(),
            "graph_get_complete"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    #[test]
    fn test_build_url_skips_missing_params() {
        let url = build_url(
            "https://graph.facebook.com/v19.0/me/accounts",
            &[("access_token", Some("abc")), ("fields", None), ("limit", Some("10"))],
        )
        .unwrap();
        assert_eq!(
            url,
            "https://graph.facebook.com/v19.0/me/accounts?access_token=abc&limit=10"
        );
    }

    #[test]
    fn test_build_url_without_params_has_no_query() {
        let url = build_url("https://graph.facebook.com/v19.0/123", &[("fields", None)]).unwrap();
        assert_eq!(url, "https://graph.facebook.com/v19.0/123");
    }

    #[test]
    fn test_build_url_encodes_values() {
        let url = build_url(
            "https://www.facebook.com/v19.0/dialog/oauth",
            &[
                ("redirect_uri", Some("http://localhost:5000/auth/callback")),
                ("scope", Some("a,b")),
            ],
        )
        .unwrap();
        assert_eq!(
            url,
            "https://www.facebook.com/v19.0/dialog/oauth?redirect_uri=http%3A%2F%2Flocalhost%3A5000%2Fauth%2Fcallback&scope=a%2Cb"
        );
    }

    #[test]
    fn test_build_url_rejects_relative_base() {
        assert!(build_url("/me/accounts", &[]).is_err());
    }

    #[test]
    fn test_classify_success() {
        let result = UpstreamResult::classify(200, json!({ "id": "1" }));
        assert!(result.is_success());
        assert_eq!(result.into_result().unwrap(), json!({ "id": "1" }));
    }

    #[test]
    fn test_classify_embedded_error_in_200() {
        let body = json!({ "error": { "message": "Invalid OAuth access token.", "code": 190 } });
        let result = UpstreamResult::classify(200, body.clone());
        assert_eq!(
            result,
            UpstreamResult::Failure(UpstreamFailure {
                status: Some(200),
                data: body,
            })
        );
    }

    #[test]
    fn test_classify_null_error_is_not_failure() {
        assert!(UpstreamResult::classify(200, json!({ "error": null })).is_success());
    }

    #[test]
    fn test_classify_http_error_with_empty_body() {
        let result = UpstreamResult::classify(500, json!({}));
        let failure = result.into_result().unwrap_err();
        assert_eq!(failure.status, Some(500));
        assert_eq!(failure.data, json!({}));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("error sending request")]
    struct SendError(#[source] std::io::Error);

    #[test]
    fn test_error_chain_includes_sources() {
        let err = SendError(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(error_chain(&err), "error sending request: connection refused");
    }

    async fn mount(server: &MockServer, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path("/v19.0/me"))
            .and(query_param("access_token", "tok"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn get_me(server: &MockServer) -> UpstreamResult {
        let base = format!("{}/v19.0/me", server.uri());
        HttpGraphClient::default()
            .get(&base, &[("access_token", Some("tok")), ("fields", None)])
            .await
    }

    #[tokio::test]
    async fn test_get_returns_parsed_body() {
        let server = MockServer::start().await;
        mount(&server, 200, r#"{"id":"42"}"#).await;

        assert_eq!(
            get_me(&server).await,
            UpstreamResult::Success {
                status: 200,
                data: json!({ "id": "42" }),
            }
        );
    }

    #[tokio::test]
    async fn test_get_unparseable_body_becomes_empty_object() {
        let server = MockServer::start().await;
        mount(&server, 200, "abc").await;

        assert_eq!(
            get_me(&server).await,
            UpstreamResult::Success {
                status: 200,
                data: json!({}),
            }
        );
    }

    #[tokio::test]
    async fn test_get_non_2xx_is_failure() {
        let server = MockServer::start().await;
        mount(&server, 500, "<html>oops</html>").await;

        assert_eq!(
            get_me(&server).await,
            UpstreamResult::Failure(UpstreamFailure {
                status: Some(500),
                data: json!({}),
            })
        );
    }

    #[tokio::test]
    async fn test_get_embedded_error_is_failure() {
        let server = MockServer::start().await;
        mount(&server, 200, r#"{"error":{"message":"bad token","code":190}}"#).await;

        let failure = get_me(&server).await.into_result().unwrap_err();
        assert_eq!(failure.status, Some(200));
        assert_eq!(failure.data["error"]["code"], 190);
    }

    #[tokio::test]
    async fn test_get_transport_error_has_no_status() {
        // Nothing listens on port 1.
        let result = HttpGraphClient::default()
            .get("http://127.0.0.1:1/v19.0/me", &[("access_token", Some("tok"))])
            .await;

        let failure = result.into_result().unwrap_err();
        assert_eq!(failure.status, None);
        let message = failure.data["error"]["message"].as_str().unwrap();
        assert!(message.contains(": "), "source chain missing: {message}");
        assert!(!message.contains("tok"));
    }

    #[test]
    fn test_failure_wire_shape() {
        let result = UpstreamResult::transport_error("connection refused");
        assert_eq!(
            result.to_json(),
            json!({
                "ok": false,
                "status": null,
                "data": { "error": { "message": "connection refused" } }
            })
        );
    }
}
