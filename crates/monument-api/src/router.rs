//! Builds the `axum::Router` wiring every route in spec §6 to its
//! handler, plus request tracing via `tower-http` (matching this
//! workspace's ambient observability stack).

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws::ws_live;

#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::liveness))
        .route("/sim/:ns/agent/:actor_id/context", get(handlers::get_context))
        .route("/sim/:ns/agent/:actor_id/action", post(handlers::post_action))
        .route("/sim/:ns/adjudicator/score", post(handlers::post_adjudicator_score))
        .route("/sim/:ns/replay", get(handlers::get_replay))
        .route("/sim/:ns/ws/live", get(ws_live))
        .route("/sim/:ns/admin/actors", post(handlers::admin_register_actor))
        .route("/sim/:ns/admin/actors/:actor_id/eliminate", post(handlers::admin_eliminate_actor))
        .route("/sim/:ns/admin/epoch", post(handlers::admin_advance_epoch))
        .route("/sim/:ns/admin/reset", post(handlers::admin_reset))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
