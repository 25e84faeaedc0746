//! Graph API access: HTTP client, account resolution and reports.
//!
//! ```text
//! user token → /me/accounts → /{page}?fields=instagram_business_account → ig_user_id
//! ig_user_id → profile | insights
//! ```

pub mod account;
pub mod client;
pub mod reports;

#[cfg(test)]
pub(crate) mod mock;

pub use account::{resolve_account, ResolveError};
pub use client::{build_url, GraphApi, HttpGraphClient, Params, UpstreamFailure, UpstreamResult};
pub use reports::{fetch_insights, fetch_profile, insights_window, unix_now};
