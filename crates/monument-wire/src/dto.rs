//! Request/response DTOs for the HTTP surface in spec §6.
//!
//! The `hud` field of [`ContextResponse`] is carried as an untyped
//! [`serde_json::Value`] rather than `monument_engine::HudPayload` — this
//! crate never depends on the engine, so `monument-api` serializes the
//! concrete payload into `Value` at the boundary.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use monument_world::{AuditRecord, Direction, Scope};
use serde::{Deserialize, Serialize};

/// `GET /sim/{ns}/agent/{id}/context` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextQuery {
    pub history_length: Option<usize>,
    pub chat_length: Option<usize>,
}

/// `GET /sim/{ns}/agent/{id}/context` response body.
#[derive(Debug, Clone, Serialize)]
pub struct ContextResponse {
    pub namespace: String,
    pub supertick_id: u64,
    pub context_hash: String,
    pub phase: String,
    pub hud: serde_json::Value,
}

/// `POST /sim/{ns}/agent/{id}/action` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub namespace: String,
    pub supertick_id: u64,
    pub context_hash: String,
    pub action: String,
    #[serde(default)]
    pub llm_input: Option<String>,
    #[serde(default)]
    pub llm_output: Option<String>,
}

/// `POST /sim/{ns}/agent/{id}/action` success response body.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    pub status: String,
    pub message: String,
}

/// `POST /sim/{ns}/adjudicator/score` request body (spec §4.8).
#[derive(Debug, Clone, Deserialize)]
pub struct AdjudicatorRequest {
    pub selected_tiles: Vec<(i32, i32)>,
    pub contributions_by_actor: BTreeMap<String, i64>,
    pub rationale: String,
    pub feedback: String,
    /// Replaces the namespace's free-text objective (spec §3) when present.
    #[serde(default)]
    pub goal: Option<String>,
}

/// `POST /sim/{ns}/adjudicator/score` response body.
#[derive(Debug, Clone, Serialize)]
pub struct AdjudicatorResponse {
    pub status: String,
    pub supertick_id: u64,
}

/// `GET /sim/{ns}/replay` query parameters: an inclusive tick range.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayQuery {
    pub from: u64,
    pub to: u64,
}

/// `GET /sim/{ns}/replay` response body.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayResponse {
    pub namespace: String,
    pub from: u64,
    pub to: u64,
    pub records: Vec<AuditRecord>,
}

/// `GET /` liveness probe response body.
#[derive(Debug, Clone, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// `POST /sim/{ns}/admin/actors` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterActorRequest {
    pub id: String,
    pub secret: String,
    pub x: i32,
    pub y: i32,
    pub facing: Direction,
    pub scopes: BTreeSet<Scope>,
    #[serde(default)]
    pub custom_instructions: String,
}

/// Generic `{"status": "ok"}`-shaped admin response.
#[derive(Debug, Clone, Serialize)]
pub struct AdminResponse {
    pub status: String,
}

/// `POST /sim/{ns}/admin/epoch` request body: raise the tick at which the
/// namespace auto-pauses, resuming it if it is currently `PAUSED`
/// (spec §4.3: "PAUSED | epoch advanced | COLLECT").
#[derive(Debug, Clone, Deserialize)]
pub struct AdvanceEpochRequest {
    pub epoch: u64,
}
