//! The in-memory authoritative state for one namespace's current tick.
//!
//! `World` is a write-through projection of the store (spec §4.2): every
//! mutation made here during a tick commit is mirrored into the store
//! inside the same transaction before it becomes visible to readers. This
//! type itself performs no I/O.

use std::collections::BTreeMap;

use crate::actor::{Actor, ActorId};
use crate::scoring::LastAdjudication;
use crate::tile::{Coord, TileColor};

/// Tile visibility policy for a namespace's context builder (spec §9:
/// fixed per namespace at creation, constant thereafter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Radius(u32),
    FullGrid,
}

/// The tick-phase state machine (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Setup,
    Collect,
    Merge,
    Broadcast,
    PausedForScoring,
    Paused,
}

/// The canonical, in-memory state of one namespace.
#[derive(Debug, Clone)]
pub struct World {
    supertick_id: u64,
    width: u32,
    height: u32,
    tiles: BTreeMap<Coord, TileColor>,
    actors: BTreeMap<ActorId, Actor>,
    goal: String,
    last_adjudication: Option<LastAdjudication>,
    phase: Phase,
    epoch: u64,
    visibility: Visibility,
    points_enabled: bool,
}

impl World {
    /// Create a fresh world for a namespace that has never ticked.
    #[must_use]
    pub fn new(width: u32, height: u32, epoch: u64, visibility: Visibility) -> Self {
        Self {
            supertick_id: 0,
            width,
            height,
            tiles: BTreeMap::new(),
            actors: BTreeMap::new(),
            goal: String::new(),
            last_adjudication: None,
            phase: Phase::Setup,
            epoch,
            visibility,
            points_enabled: false,
        }
    }

    #[must_use]
    pub fn supertick_id(&self) -> u64 {
        self.supertick_id
    }

    pub fn set_supertick_id(&mut self, id: u64) {
        self.supertick_id = id;
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn in_bounds(&self, (x, y): Coord) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[must_use]
    pub fn tiles(&self) -> &BTreeMap<Coord, TileColor> {
        &self.tiles
    }

    #[must_use]
    pub fn tile_at(&self, coord: Coord) -> Option<TileColor> {
        self.tiles.get(&coord).copied()
    }

    /// Paint a tile. Returns the previous color, if any.
    pub fn set_tile(&mut self, coord: Coord, color: TileColor) -> Option<TileColor> {
        self.tiles.insert(coord, color)
    }

    #[must_use]
    pub fn actors(&self) -> &BTreeMap<ActorId, Actor> {
        &self.actors
    }

    #[must_use]
    pub fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn actor_mut(&mut self, id: &ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id)
    }

    pub fn insert_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.id.clone(), actor);
    }

    /// Actor ids at the given coordinate, in deterministic (sorted) order.
    #[must_use]
    pub fn actor_at(&self, coord: Coord) -> Option<&ActorId> {
        self.actors
            .values()
            .find(|a| a.position() == coord)
            .map(|a| &a.id)
    }

    /// Actor ids registered and non-eliminated, in deterministic order —
    /// this is "the registered-actor set" TIMEOUT fill applies to (§9).
    pub fn active_actor_ids(&self) -> impl Iterator<Item = &ActorId> {
        self.actors
            .values()
            .filter(|a| a.is_active())
            .map(|a| &a.id)
    }

    #[must_use]
    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn set_goal(&mut self, goal: impl Into<String>) {
        self.goal = goal.into();
    }

    #[must_use]
    pub fn last_adjudication(&self) -> Option<&LastAdjudication> {
        self.last_adjudication.as_ref()
    }

    pub fn set_last_adjudication(&mut self, adjudication: LastAdjudication) {
        self.last_adjudication = Some(adjudication);
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn set_epoch(&mut self, epoch: u64) {
        self.epoch = epoch;
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    #[must_use]
    pub fn points_enabled(&self) -> bool {
        self.points_enabled
    }

    pub fn set_points_enabled(&mut self, points_enabled: bool) {
        self.points_enabled = points_enabled;
    }
}
