//! One function per route (spec §6). Each handler: parses/validates its
//! namespace and headers, looks up (or lazily opens) the namespace
//! actor, round-trips a message through it, and maps the result onto the
//! wire DTOs and [`ApiError`].

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use monument_engine::ActionSubmission;
use monument_world::{Actor, ActorId};
use monument_wire::action::parse_action;
use monument_wire::dto::{
    AdjudicatorRequest, AdjudicatorResponse, AdminResponse, AdvanceEpochRequest, ContextQuery,
    ContextResponse, LivenessResponse, RegisterActorRequest, ReplayQuery, ReplayResponse,
};
use monument_wire::ApiError;

use crate::error::from_engine_error;
use crate::state::AppState;
use crate::util::{header_value, parse_namespace, require_admin_secret};

pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "ok" })
}

pub async fn get_context(
    State(state): State<AppState>,
    Path((ns, actor_id)): Path<(String, String)>,
    Query(query): Query<ContextQuery>,
    headers: HeaderMap,
) -> Result<Json<ContextResponse>, ApiError> {
    let namespace = parse_namespace(&ns)?;
    let actor_id = ActorId::new(actor_id);
    let handle = state.registry.handle_for(&namespace)?;

    let frozen = handle.snapshot();
    let actor = frozen.actor(&actor_id).filter(|a| a.is_active()).ok_or(ApiError::UnknownActor)?;
    let secret = header_value(&headers, "X-Agent-Secret").unwrap_or_default();
    if actor.secret != secret {
        return Err(ApiError::AuthFailed);
    }

    let chat_length = query.chat_length.unwrap_or(state.default_chat_length);
    let history_length = query.history_length.unwrap_or(state.default_history_length);
    let hud = handle.fetch_hud(actor_id, chat_length, history_length).await.map_err(from_engine_error)?;

    Ok(Json(ContextResponse {
        namespace: namespace.as_str().to_string(),
        supertick_id: frozen.supertick_id,
        context_hash: frozen.context_hash.clone(),
        phase: phase_name(frozen.phase),
        hud: serde_json::to_value(&hud).map_err(|e| ApiError::Internal(e.to_string()))?,
    }))
}

fn phase_name(phase: monument_world::Phase) -> String {
    serde_json::to_value(phase)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

pub async fn post_action(
    State(state): State<AppState>,
    Path((ns, actor_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<monument_wire::dto::ActionRequest>,
) -> Result<Json<monument_wire::dto::ActionResponse>, ApiError> {
    let namespace = parse_namespace(&ns)?;
    if namespace.as_str() != body.namespace {
        return Err(ApiError::InvalidNamespace);
    }
    let actor_id = ActorId::new(actor_id);
    let secret = header_value(&headers, "X-Agent-Secret").unwrap_or_default().to_string();
    let intent = parse_action(&body.action)?;

    let handle = state.registry.handle_for(&namespace)?;
    let submission = ActionSubmission {
        actor_id,
        secret,
        supertick_id: body.supertick_id,
        context_hash: body.context_hash,
        intent,
        llm_input: body.llm_input,
        llm_output: body.llm_output,
    };
    handle.submit_action(submission).await.map_err(from_engine_error)?;

    Ok(Json(monument_wire::dto::ActionResponse {
        status: "accepted".to_string(),
        message: "action recorded for this tick".to_string(),
    }))
}

pub async fn post_adjudicator_score(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    Json(body): Json<AdjudicatorRequest>,
) -> Result<Json<AdjudicatorResponse>, ApiError> {
    let namespace = parse_namespace(&ns)?;
    let handle = state.registry.handle_for(&namespace)?;

    let contributions_by_actor = body
        .contributions_by_actor
        .into_iter()
        .map(|(id, delta)| (ActorId::new(id), delta))
        .collect();

    let round = monument_engine::ScoringRoundInput {
        selected_tiles: body.selected_tiles,
        contributions_by_actor,
        rationale: body.rationale,
        feedback: body.feedback,
        goal: body.goal,
    };
    handle.submit_scoring(round).await.map_err(from_engine_error)?;
    let supertick_id = handle.snapshot().supertick_id;

    Ok(Json(AdjudicatorResponse { status: "committed".to_string(), supertick_id }))
}

pub async fn get_replay(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    Query(query): Query<ReplayQuery>,
) -> Result<Json<ReplayResponse>, ApiError> {
    let namespace = parse_namespace(&ns)?;
    let handle = state.registry.handle_for(&namespace)?;
    let records = handle.replay(query.from, query.to).await.map_err(from_engine_error)?;

    Ok(Json(ReplayResponse {
        namespace: namespace.as_str().to_string(),
        from: query.from,
        to: query.to,
        records,
    }))
}

pub async fn admin_register_actor(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    headers: HeaderMap,
    Json(body): Json<RegisterActorRequest>,
) -> Result<Json<AdminResponse>, ApiError> {
    require_admin_secret(&state, &headers)?;
    let namespace = parse_namespace(&ns)?;
    let handle = state.registry.handle_for(&namespace)?;

    let actor = Actor {
        id: ActorId::new(body.id),
        secret: body.secret,
        x: body.x,
        y: body.y,
        facing: body.facing,
        scopes: body.scopes,
        custom_instructions: body.custom_instructions,
        eliminated_at: None,
    };
    handle.register_actor(actor).await.map_err(from_engine_error)?;

    Ok(Json(AdminResponse { status: "ok".to_string() }))
}

pub async fn admin_eliminate_actor(
    State(state): State<AppState>,
    Path((ns, actor_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<AdminResponse>, ApiError> {
    require_admin_secret(&state, &headers)?;
    let namespace = parse_namespace(&ns)?;
    let handle = state.registry.handle_for(&namespace)?;
    handle.eliminate_actor(ActorId::new(actor_id)).await.map_err(from_engine_error)?;

    Ok(Json(AdminResponse { status: "ok".to_string() }))
}

pub async fn admin_advance_epoch(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    headers: HeaderMap,
    Json(body): Json<AdvanceEpochRequest>,
) -> Result<Json<AdminResponse>, ApiError> {
    require_admin_secret(&state, &headers)?;
    let namespace = parse_namespace(&ns)?;
    let handle = state.registry.handle_for(&namespace)?;
    handle.advance_epoch(body.epoch).await.map_err(from_engine_error)?;

    Ok(Json(AdminResponse { status: "ok".to_string() }))
}

pub async fn admin_reset(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    headers: HeaderMap,
) -> Result<Json<AdminResponse>, ApiError> {
    require_admin_secret(&state, &headers)?;
    let namespace = parse_namespace(&ns)?;
    state.registry.reset(&namespace)?;

    Ok(Json(AdminResponse { status: "ok".to_string() }))
}
