//! HTTP-facing error taxonomy.
//!
//! - configuration errors: 500, the process keeps serving other routes
//! - client errors: 400/401, no state change
//! - upstream errors: 400 with the upstream status and body passed through
//! - domain errors: 400, tagged so callers can tell them from upstream errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::graph::{ResolveError, UpstreamFailure};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Config(String),

    #[error("missing 'code' in OAuth callback")]
    MissingCode,

    #[error("X-Hub-Signature missing or invalid")]
    InvalidSignature,

    #[error("{0}")]
    InvalidPayload(String),

    #[error("not logged in; visit /auth/login first")]
    Unauthenticated,

    #[error("upstream request failed")]
    Upstream(UpstreamFailure),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl From<UpstreamFailure> for ApiError {
    fn from(failure: UpstreamFailure) -> Self {
        ApiError::Upstream(failure)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidSignature | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::MissingCode
            | ApiError::InvalidPayload(_)
            | ApiError::Upstream(_)
            | ApiError::Resolve(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::InvalidSignature => (status, "Unauthorized").into_response(),
            ApiError::Upstream(failure) => (status, Json(failure.to_json())).into_response(),
            ApiError::Resolve(e) => (status, Json(e.to_json())).into_response(),
            other => (status, Json(json!({ "ok": false, "error": other.to_string() })))
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Config("x".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::MissingCode.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidSignature.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(ResolveError::NoLinkedAccount).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
