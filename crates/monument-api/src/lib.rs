//! # monument-api
//!
//! The `axum` HTTP/WS adapter over `monument-engine` (spec §6): a thin
//! translation layer between wire DTOs and namespace-actor messages. No
//! business logic lives here beyond request parsing, namespace lookup,
//! and `EngineError` → `ApiError` mapping.

mod error;
mod handlers;
mod registry;
mod router;
mod state;
mod util;
mod ws;

pub use registry::{Registry, RegistryConfig};
pub use router::build_router;
pub use state::AppState;
