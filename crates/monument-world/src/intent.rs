//! Intents (what an agent asked for) and outcomes (what the engine
//! resolved), per spec §4.5 and §4.6.

use crate::actor::{Direction, Scope};
use crate::tile::{Coord, TileColor};

/// A parsed, validated action request body.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Intent {
    Move { direction: Direction },
    Paint { color: TileColor, target: Option<Coord> },
    Speak { message: String },
    Wait,
    Skip,
}

impl Intent {
    /// The scope required to submit this intent.
    #[must_use]
    pub fn required_scope(&self) -> Scope {
        match self {
            Intent::Move { .. } => Scope::Move,
            Intent::Paint { .. } => Scope::Paint,
            Intent::Speak { .. } => Scope::Speak,
            Intent::Wait => Scope::Wait,
            Intent::Skip => Scope::Skip,
        }
    }

    /// The machine-readable intent name used in audit rows and HUD text.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Intent::Move { .. } => "MOVE",
            Intent::Paint { .. } => "PAINT",
            Intent::Speak { .. } => "SPEAK",
            Intent::Wait => "WAIT",
            Intent::Skip => "SKIP",
        }
    }
}

/// What the engine resolved a journal row to, once a tick commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success,
    Invalid,
    ConflictLost,
    Timeout,
    NoOp,
}

impl Outcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::Invalid => "INVALID",
            Outcome::ConflictLost => "CONFLICT_LOST",
            Outcome::Timeout => "TIMEOUT",
            Outcome::NoOp => "NO_OP",
        }
    }
}
