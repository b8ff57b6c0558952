//! The frozen snapshot published at the start of every COLLECT (spec §4.3,
//! §9: "frozen snapshot").

use std::collections::BTreeMap;

use monument_world::{Actor, ActorId, Coord, LastAdjudication, Phase, TileColor, Visibility, World};
use serde::Serialize;

/// The canonical, hashed view of a namespace's world at the start of tick
/// `supertick_id`'s COLLECT phase. Immutable once built; both the
/// `context_hash` and every agent's HUD are derived from exactly this
/// struct, so nothing can drift between them (spec §4.7).
#[derive(Debug, Clone, Serialize)]
pub struct FrozenSnapshot {
    pub supertick_id: u64,
    pub width: u32,
    pub height: u32,
    pub tiles: BTreeMap<Coord, TileColor>,
    pub actors: BTreeMap<ActorId, Actor>,
    pub goal: String,
    pub last_adjudication: Option<LastAdjudication>,
    /// The namespace's phase as of the moment this snapshot was
    /// published. Not part of the hashed payload — agents never submit a
    /// `phase` back to us, so varying it can't desync the staleness
    /// token.
    #[serde(skip)]
    pub phase: Phase,
    #[serde(skip)]
    pub visibility: Visibility,
    #[serde(skip)]
    pub context_hash: String,
}

impl FrozenSnapshot {
    /// Freeze `world` and stamp the resulting snapshot with its
    /// `context_hash`. Called once per tick, on entering COLLECT.
    #[must_use]
    pub fn freeze(world: &World) -> Self {
        let mut snapshot = Self {
            supertick_id: world.supertick_id(),
            width: world.width(),
            height: world.height(),
            tiles: world.tiles().clone(),
            actors: world.actors().clone(),
            goal: world.goal().to_string(),
            last_adjudication: world.last_adjudication().cloned(),
            phase: world.phase(),
            visibility: world.visibility(),
            context_hash: String::new(),
        };
        snapshot.context_hash = compute_context_hash(&snapshot);
        snapshot
    }

    #[must_use]
    pub fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }
}

/// Canonicalize the hashed subset of a snapshot
/// (`supertick_id, width, height, tiles, actors, goal, last_adjudication`)
/// via `rmp_serde`'s named (self-describing, deterministic) encoding, then
/// hash it with `blake3`. `BTreeMap` iteration order makes this stable
/// without any extra sort step (spec §9).
fn compute_context_hash(snapshot: &FrozenSnapshot) -> String {
    let bytes = rmp_serde::to_vec_named(snapshot).expect("snapshot always serializes");
    blake3::hash(&bytes).to_hex().to_string()
}
