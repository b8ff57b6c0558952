//! The Context Builder: assembles the agent-visible HUD payload (spec
//! §4.7). The HUD and the frozen snapshot's `context_hash` are derived
//! from the same `FrozenSnapshot`, so nothing rendered here can drift
//! from what was hashed.

use std::collections::BTreeMap;

use monument_store::Store;
use monument_world::{ActorId, ChatMessage, Coord, Direction, LastAdjudication, Outcome, Scope, TileColor};
use serde::Serialize;

use crate::error::EngineError;
use crate::snapshot::FrozenSnapshot;

/// One actor's position and facing, as seen by another actor's HUD.
#[derive(Debug, Clone, Serialize)]
pub struct VisibleActor {
    pub id: ActorId,
    pub position: Coord,
    pub facing: Direction,
}

/// The outcome of the actor's previous tick (spec §4.7 section 3).
#[derive(Debug, Clone, Serialize)]
pub struct LastTickResult {
    pub intent_type: String,
    pub outcome: Outcome,
    pub reason: Option<String>,
    pub point_delta: i64,
}

/// The full HUD payload for one actor's context fetch, in the section
/// order required by spec §4.7.
#[derive(Debug, Clone, Serialize)]
pub struct HudPayload {
    pub namespace: String,
    pub supertick_id: u64,
    pub actor_id: String,
    pub position: Coord,
    pub facing: Direction,
    pub scopes: Vec<Scope>,
    pub goal: String,
    pub last_tick_result: Option<LastTickResult>,
    /// Trailing `LAST_TICK_RESULT` entries older than the most recent one,
    /// oldest first, bounded by `history_length` (spec §6).
    pub recent_tick_results: Vec<LastTickResult>,
    pub last_adjudication: Option<LastAdjudication>,
    pub visible_tiles: BTreeMap<Coord, TileColor>,
    pub visible_actors: Vec<VisibleActor>,
    pub recent_chat: Vec<ChatMessage>,
    /// Opaque pass-through from the memory service (out of scope to
    /// implement here; always empty in this build).
    pub recalled_memories: Vec<String>,
    pub available_actions: Vec<Scope>,
}

/// Assembles a [`HudPayload`] for `actor_id` from `frozen`, pulling the
/// history-dependent sections (`LAST_TICK_RESULT`, trailing tick-result
/// history bounded by `history_length`, recent chat bounded by
/// `chat_length`) from the store. Visible tiles/actors are filtered by the
/// namespace's fixed [`monument_world::Visibility`] policy.
pub fn build_hud(
    namespace: &str,
    frozen: &FrozenSnapshot,
    store: &Store,
    actor_id: &ActorId,
    chat_length: usize,
    history_length: usize,
) -> Result<HudPayload, EngineError> {
    let actor = frozen.actor(actor_id).ok_or(EngineError::UnknownActor)?;

    let last_tick_result = if frozen.supertick_id > 0 {
        store
            .audit_record_for(frozen.supertick_id - 1, actor_id)?
            .map(|record| LastTickResult {
                intent_type: record.action_type,
                outcome: record.result,
                reason: record.reason,
                point_delta: 0,
            })
    } else {
        None
    };

    let recent_tick_results = if frozen.supertick_id > 0 && history_length > 0 {
        store
            .recent_tick_results(actor_id, frozen.supertick_id - 1, history_length)?
            .into_iter()
            .map(|record| LastTickResult {
                intent_type: record.action_type,
                outcome: record.result,
                reason: record.reason,
                point_delta: 0,
            })
            .collect()
    } else {
        Vec::new()
    };

    let visible_tiles = visible_tiles(frozen, actor.position());
    let visible_actors = frozen
        .actors
        .values()
        .filter(|a| a.id != *actor_id && a.is_active() && visible(frozen, actor.position(), a.position()))
        .map(|a| VisibleActor { id: a.id.clone(), position: a.position(), facing: a.facing })
        .collect();

    let recent_chat = store.recent_chat(chat_length)?;

    Ok(HudPayload {
        namespace: namespace.to_string(),
        supertick_id: frozen.supertick_id,
        actor_id: actor_id.as_str().to_string(),
        position: actor.position(),
        facing: actor.facing,
        scopes: actor.scopes.iter().copied().collect(),
        goal: frozen.goal.clone(),
        last_tick_result,
        recent_tick_results,
        last_adjudication: frozen.last_adjudication.clone(),
        visible_tiles,
        visible_actors,
        recent_chat,
        recalled_memories: Vec::new(),
        available_actions: actor.scopes.iter().copied().collect(),
    })
}

fn visible(frozen: &FrozenSnapshot, from: Coord, to: Coord) -> bool {
    match frozen.visibility {
        monument_world::Visibility::FullGrid => true,
        monument_world::Visibility::Radius(r) => {
            let dx = (from.0 - to.0).unsigned_abs();
            let dy = (from.1 - to.1).unsigned_abs();
            dx <= r && dy <= r
        }
    }
}

fn visible_tiles(frozen: &FrozenSnapshot, from: Coord) -> BTreeMap<Coord, TileColor> {
    match frozen.visibility {
        monument_world::Visibility::FullGrid => frozen.tiles.clone(),
        monument_world::Visibility::Radius(_) => frozen
            .tiles
            .iter()
            .filter(|(&coord, _)| visible(frozen, from, coord))
            .map(|(&coord, &color)| (coord, color))
            .collect(),
    }
}
