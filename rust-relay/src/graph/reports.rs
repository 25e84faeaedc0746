//! Read-only reports for the resolved business account.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::info;

use super::client::{GraphApi, UpstreamFailure};

/// Fields requested for the profile report.
pub const PROFILE_FIELDS: &str = "id,username,profile_picture_url";

/// Metrics requested for the insights report.
pub const INSIGHTS_METRICS: &str = "impressions,reach,profile_views";

/// Length of the insights window in seconds (7 days).
pub const INSIGHTS_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;

/// Trailing 7-day window ending at `now`, as `(since, until)` epoch seconds.
pub fn insights_window(now: i64) -> (i64, i64) {
    (now - INSIGHTS_WINDOW_SECS, now)
}

/// Current time in epoch seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

pub async fn fetch_profile(
    api: &dyn GraphApi,
    graph_base: &str,
    token: &str,
    ig_user_id: &str,
) -> Result<Value, UpstreamFailure> {
    info!(ig_user_id = ig_user_id, "profile_fetch_start");

    api.get(
        &format!("{}/{}", graph_base, ig_user_id),
        &[("fields", Some(PROFILE_FIELDS)), ("access_token", Some(token))],
    )
    .await
    .into_result()
}

/// Daily metrics over the 7 days ending at `now`.
pub async fn fetch_insights(
    api: &dyn GraphApi,
    graph_base: &str,
    token: &str,
    ig_user_id: &str,
    now: i64,
) -> Result<Value, UpstreamFailure> {
    let (since, until) = insights_window(now);
    let since = since.to_string();
    let until = until.to_string();

    info!(
        ig_user_id = ig_user_id,
        since = %since,
        until = %until,
        "insights_fetch_start"
    );

    api.get(
        &format!("{}/{}/insights", graph_base, ig_user_id),
        &[
            ("metric", Some(INSIGHTS_METRICS)),
            ("period", Some("day")),
            ("since", Some(since.as_str())),
            ("until", Some(until.as_str())),
            ("access_token", Some(token)),
        ],
    )
    .await
    .into_result()
}
