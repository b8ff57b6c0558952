//! Scoring rounds and the adjudication record carried in `World`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::actor::ActorId;
use crate::tile::Coord;

/// One committed scoring round.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoringRound {
    pub supertick_id: u64,
    pub selected_tiles: Vec<Coord>,
    pub contributions_by_actor: BTreeMap<ActorId, i64>,
    pub rationale: String,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}

/// The summary of the most recent scoring round, as surfaced in the HUD's
/// `LAST_ADJUDICATION` section (spec §4.7).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LastAdjudication {
    pub supertick_id: u64,
    pub rationale: String,
    pub feedback: String,
}

impl From<&ScoringRound> for LastAdjudication {
    fn from(round: &ScoringRound) -> Self {
        Self {
            supertick_id: round.supertick_id,
            rationale: round.rationale.clone(),
            feedback: round.feedback.clone(),
        }
    }
}
