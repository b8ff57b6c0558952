//! Actors: the registered agents that inhabit a namespace's grid.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::tile::Coord;

/// A validated actor identifier, unique within its namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Wrap a raw string as an actor id. Actor ids are validated by the
    /// admin surface that creates them, not re-validated on every use.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Compass facing / movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    N,
    S,
    E,
    W,
}

impl Direction {
    /// The `(dx, dy)` delta of moving one cell in this direction. `y`
    /// grows south, so `N` decreases `y`.
    #[must_use]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::N => (0, -1),
            Direction::S => (0, 1),
            Direction::E => (1, 0),
            Direction::W => (-1, 0),
        }
    }

    /// Apply this direction's delta to a coordinate.
    #[must_use]
    pub fn apply(self, (x, y): Coord) -> Coord {
        let (dx, dy) = self.delta();
        (x + dx, y + dy)
    }
}

/// An intent an actor is permitted to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Scope {
    Move,
    Paint,
    Speak,
    Wait,
    Skip,
}

/// A registered agent.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Actor {
    pub id: ActorId,
    /// Opaque shared secret checked on every action submission. Never
    /// serialized into a snapshot or HUD payload — it is not part of the
    /// "payload exposed to agents" the context hash is a function of
    /// (spec §4.7).
    #[serde(skip_serializing, default)]
    pub secret: String,
    pub x: i32,
    pub y: i32,
    pub facing: Direction,
    pub scopes: BTreeSet<Scope>,
    pub custom_instructions: String,
    pub eliminated_at: Option<DateTime<Utc>>,
}

impl Actor {
    /// `true` unless the actor has been administratively eliminated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.eliminated_at.is_none()
    }

    #[must_use]
    pub fn position(&self) -> Coord {
        (self.x, self.y)
    }

    /// `true` if `intent` is within this actor's permitted scopes.
    #[must_use]
    pub fn permits(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }
}
