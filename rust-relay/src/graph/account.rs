//! Resolve the Instagram business account linked to a user's pages.

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use super::client::{GraphApi, UpstreamFailure};

/// Why an account could not be resolved.
#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    /// The page listing call itself failed.
    #[error("upstream request failed")]
    Upstream(UpstreamFailure),

    /// Every page was checked and none carries a linked business account.
    #[error("no Instagram business account is linked to this user's pages")]
    NoLinkedAccount,
}

impl ResolveError {
    pub fn to_json(&self) -> Value {
        match self {
            ResolveError::Upstream(failure) => failure.to_json(),
            ResolveError::NoLinkedAccount => json!({
                "ok": false,
                "code": "no_linked_account",
                "error": self.to_string(),
            }),
        }
    }
}

/// Walk the pages managed by `token`'s owner and return the first linked
/// business-account id.
///
/// Pages are checked one at a time in upstream order. A failed lookup on a
/// single page is skipped; only a failed page listing aborts.
pub async fn resolve_account(
    api: &dyn GraphApi,
    graph_base: &str,
    token: &str,
) -> Result<String, ResolveError> {
    let pages = api
        .get(
            &format!("{}/me/accounts", graph_base),
            &[("access_token", Some(token))],
        )
        .await
        .into_result()
        .map_err(|failure| {
            warn!(status_code = ?failure.status, "account_pages_fetch_failed");
            ResolveError::Upstream(failure)
        })?;

    let page_ids: Vec<&str> = pages
        .get("data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|page| page.get("id").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    info!(page_count = page_ids.len(), "account_pages_fetched");

    for page_id in page_ids {
        let lookup = api
            .get(
                &format!("{}/{}", graph_base, page_id),
                &[
                    ("fields", Some("instagram_business_account")),
                    ("access_token", Some(token)),
                ],
            )
            .await;

        let data = match lookup.into_result() {
            Ok(d) => d,
            Err(failure) => {
                warn!(page_id = page_id, status_code = ?failure.status, "account_page_lookup_failed");
                continue;
            }
        };

        let linked = data
            .get("instagram_business_account")
            .and_then(|acct| acct.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty());

        if let Some(id) = linked {
            info!(page_id = page_id, ig_user_id = id, "account_resolved");
            return Ok(id.to_string());
        }
    }

    warn!("account_no_linked_business_account");
    Err(ResolveError::NoLinkedAccount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::mock::{err, ok, MockGraphApi};

    const BASE: &str = "https://graph.test/v19.0";

    #[tokio::test]
    async fn test_resolve_first_linked_page_wins() {
        let api = MockGraphApi::new(|call| match call.url.as_str() {
            "https://graph.test/v19.0/me/accounts" => {
                ok(json!({ "data": [{ "id": "p1" }, { "id": "p2" }, { "id": "p3" }] }))
            }
            "https://graph.test/v19.0/p1" => ok(json!({ "id": "p1" })),
            "https://graph.test/v19.0/p2" => {
                ok(json!({ "id": "p2", "instagram_business_account": { "id": "ig-2" } }))
            }
            _ => ok(json!({ "id": "p3", "instagram_business_account": { "id": "ig-3" } })),
        });

        let id = resolve_account(&api, BASE, "tok").await.unwrap();
        assert_eq!(id, "ig-2");

        let calls = api.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].param("access_token"), Some("tok"));
        assert_eq!(calls[2].param("fields"), Some("instagram_business_account"));
    }

    #[tokio::test]
    async fn test_resolve_listing_failure_is_upstream_error() {
        let api = MockGraphApi::new(|_| {
            err(400, json!({ "error": { "message": "bad token", "code": 190 } }))
        });

        let result = resolve_account(&api, BASE, "tok").await;
        match result {
            Err(ResolveError::Upstream(failure)) => assert_eq!(failure.status, Some(400)),
            other => panic!("Expected upstream error, got {:?}", other),
        }
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_zero_pages_is_no_linked_account() {
        let api = MockGraphApi::new(|_| ok(json!({ "data": [] })));
        let result = resolve_account(&api, BASE, "tok").await;
        assert_eq!(result, Err(ResolveError::NoLinkedAccount));
    }

    #[tokio::test]
    async fn test_resolve_skips_failed_and_empty_pages() {
        let api = MockGraphApi::new(|call| match call.url.as_str() {
            "https://graph.test/v19.0/me/accounts" => {
                ok(json!({ "data": [{ "id": "p1" }, { "id": "p2" }] }))
            }
            "https://graph.test/v19.0/p1" => err(500, json!({})),
            _ => ok(json!({ "instagram_business_account": { "id": "" } })),
        });

        let result = resolve_account(&api, BASE, "tok").await;
        assert_eq!(result, Err(ResolveError::NoLinkedAccount));
        assert_eq!(api.calls().len(), 3);
    }

    #[test]
    fn test_no_linked_account_json_is_distinguishable() {
        let body = ResolveError::NoLinkedAccount.to_json();
        assert_eq!(body["code"], "no_linked_account");
        assert!(body.get("status").is_none());
    }
}
