use axum::http::HeaderMap;
use monument_world::Namespace;
use monument_wire::ApiError;

use crate::state::AppState;

pub(crate) fn parse_namespace(raw: &str) -> Result<Namespace, ApiError> {
    Namespace::parse(raw).map_err(|_| ApiError::InvalidNamespace)
}

pub(crate) fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub(crate) fn require_admin_secret(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    match header_value(headers, "X-Admin-Secret") {
        Some(secret) if secret == &*state.admin_secret => Ok(()),
        _ => Err(ApiError::AuthFailed),
    }
}
