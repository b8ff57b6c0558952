//! The error taxonomy and HTTP status mapping (spec §7).
//!
//! `ApiError` is the single enum every handler in `monument-api` returns
//! on its `Err` path; its `Display` embeds the three substrings the
//! agent-side client is required to be able to classify on without
//! schema surgery: `"already submitted"`, `"Context hash mismatch"`, and
//! `"Supertick mismatch"`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Every error a request against this server can surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("invalid namespace identifier")]
    InvalidNamespace,

    #[error("unknown namespace")]
    UnknownNamespace,

    #[error("unknown actor or actor eliminated")]
    UnknownActor,

    #[error("bad secret")]
    AuthFailed,

    #[error("intent not permitted for actor (ScopeDenied)")]
    ScopeDenied,

    #[error("submission outside COLLECT (PhaseMismatch)")]
    PhaseMismatch,

    #[error("Supertick mismatch: submission targets tick {submitted}, namespace is at tick {current}")]
    SupertickMismatch { submitted: u64, current: u64 },

    #[error("Context hash mismatch: submitted hash does not match the current snapshot")]
    ContextHashMismatch,

    #[error("already submitted: a journal row already exists for this actor and tick")]
    AlreadySubmitted,

    #[error("malformed action: {0}")]
    MalformedAction(String),

    #[error("store schema mismatch: namespace refused")]
    SchemaMismatch,

    #[error("store busy: timed out waiting for a write lock")]
    StoreBusy,

    #[error("namespace poisoned after an internal error; refusing further requests")]
    Poisoned,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The short machine code returned alongside the human-readable
    /// detail string, for callers that want to branch without string
    /// matching on `Display`.
    #[must_use]
    pub fn machine_code(&self) -> &'static str {
        match self {
            ApiError::InvalidNamespace => "INVALID_NAMESPACE",
            ApiError::UnknownNamespace => "UNKNOWN_NAMESPACE",
            ApiError::UnknownActor => "UNKNOWN_ACTOR",
            ApiError::AuthFailed => "AUTH_FAILED",
            ApiError::ScopeDenied => "SCOPE_DENIED",
            ApiError::PhaseMismatch => "PHASE_MISMATCH",
            ApiError::SupertickMismatch { .. } => "SUPERTICK_MISMATCH",
            ApiError::ContextHashMismatch => "CONTEXT_HASH_MISMATCH",
            ApiError::AlreadySubmitted => "ALREADY_SUBMITTED",
            ApiError::MalformedAction(_) => "MALFORMED_ACTION",
            ApiError::SchemaMismatch => "SCHEMA_MISMATCH",
            ApiError::StoreBusy => "STORE_BUSY",
            ApiError::Poisoned => "POISONED",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    /// The HTTP status this error maps onto (spec §6 "HTTP status codes").
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        match self {
            ApiError::InvalidNamespace | ApiError::MalformedAction(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthFailed => StatusCode::UNAUTHORIZED,
            ApiError::ScopeDenied => StatusCode::FORBIDDEN,
            ApiError::UnknownNamespace | ApiError::UnknownActor => StatusCode::NOT_FOUND,
            ApiError::PhaseMismatch
            | ApiError::AlreadySubmitted
            | ApiError::SupertickMismatch { .. }
            | ApiError::ContextHashMismatch => StatusCode::CONFLICT,
            ApiError::SchemaMismatch | ApiError::StoreBusy | ApiError::Poisoned => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let body = ErrorBody { code: self.machine_code(), detail: self.to_string() };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_submitted_detail_contains_required_substring() {
        assert!(ApiError::AlreadySubmitted.to_string().contains("already submitted"));
    }

    #[test]
    fn context_hash_mismatch_detail_contains_required_substring() {
        assert!(ApiError::ContextHashMismatch.to_string().contains("Context hash mismatch"));
    }

    #[test]
    fn supertick_mismatch_detail_contains_required_substring() {
        let e = ApiError::SupertickMismatch { submitted: 7, current: 8 };
        assert!(e.to_string().contains("Supertick mismatch"));
    }

    #[test]
    fn status_codes_match_spec_table() {
        assert_eq!(ApiError::InvalidNamespace.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::AuthFailed.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::ScopeDenied.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::UnknownNamespace.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::AlreadySubmitted.http_status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Internal(String::new()).http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
