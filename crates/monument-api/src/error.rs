//! Maps `monument-engine`/`monument-store` errors onto `monument-wire::ApiError`
//! (spec §7). Free functions rather than `From` impls: neither `ApiError`
//! nor `EngineError`/`StoreError` is defined in this crate, so a trait
//! impl would violate the orphan rule.

use monument_engine::EngineError;
use monument_store::StoreError;
use monument_wire::ApiError;

#[must_use]
pub fn from_engine_error(err: EngineError) -> ApiError {
    match err {
        EngineError::UnknownNamespace => ApiError::UnknownNamespace,
        EngineError::UnknownActor => ApiError::UnknownActor,
        EngineError::AuthFailed => ApiError::AuthFailed,
        EngineError::ScopeDenied => ApiError::ScopeDenied,
        EngineError::PhaseMismatch => ApiError::PhaseMismatch,
        EngineError::SupertickMismatch { submitted, current } => {
            ApiError::SupertickMismatch { submitted, current }
        }
        EngineError::ContextHashMismatch => ApiError::ContextHashMismatch,
        EngineError::AlreadySubmitted => ApiError::AlreadySubmitted,
        EngineError::MalformedAction(detail) => ApiError::MalformedAction(detail),
        EngineError::Store(e) => from_store_error(e),
        EngineError::Poisoned => ApiError::Poisoned,
        EngineError::Internal(detail) => ApiError::Internal(detail),
    }
}

#[must_use]
pub fn from_store_error(err: StoreError) -> ApiError {
    let detail = err.to_string();
    match err {
        StoreError::InvalidNamespace(e) => ApiError::MalformedAction(e.to_string()),
        StoreError::SchemaMismatch { .. } => ApiError::SchemaMismatch,
        StoreError::Busy => ApiError::StoreBusy,
        StoreError::Io(_) | StoreError::Corrupt(_) => ApiError::Internal(detail),
    }
}
