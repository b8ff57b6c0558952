//! Journal entries (per-tick staging) and audit records (append-only
//! history), per spec §3.

use chrono::{DateTime, Utc};

use crate::actor::ActorId;
use crate::intent::{Intent, Outcome};

/// The staging status of a journal row before a tick's merge commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalStatus {
    Pending,
    Committed,
    Rejected,
}

/// One actor's staged submission for one tick. Exactly one row exists per
/// `(supertick_id, actor_id)` once submitted or synthesized.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JournalEntry {
    pub supertick_id: u64,
    pub actor_id: ActorId,
    pub intent: Intent,
    pub status: JournalStatus,
    pub result: Option<Outcome>,
    pub submitted_at: DateTime<Utc>,
    /// Optional traceability fields carried from the action submission.
    pub llm_input: Option<String>,
    pub llm_output: Option<String>,
}

impl JournalEntry {
    /// Build a pending entry for a freshly validated submission.
    #[must_use]
    pub fn pending(
        supertick_id: u64,
        actor_id: ActorId,
        intent: Intent,
        submitted_at: DateTime<Utc>,
        llm_input: Option<String>,
        llm_output: Option<String>,
    ) -> Self {
        Self {
            supertick_id,
            actor_id,
            intent,
            status: JournalStatus::Pending,
            result: None,
            submitted_at,
            llm_input,
            llm_output,
        }
    }

    /// Synthesize the `TIMEOUT` row the resolver inserts for actors that
    /// never submitted before the collect deadline (spec §4.3).
    #[must_use]
    pub fn synthesize_timeout(supertick_id: u64, actor_id: ActorId, at: DateTime<Utc>) -> Self {
        Self {
            supertick_id,
            actor_id,
            intent: Intent::Wait,
            status: JournalStatus::Pending,
            result: None,
            submitted_at: at,
            llm_input: None,
            llm_output: None,
        }
    }
}

/// An append-only audit row, one per actor per resolved tick.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AuditRecord {
    pub supertick_id: u64,
    pub actor_id: ActorId,
    pub action_type: String,
    pub params: String,
    pub result: Outcome,
    pub reason: Option<String>,
    pub context_hash: String,
    pub submitted_at: DateTime<Utc>,
}

/// One append-only tile mutation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TileHistoryEntry {
    pub x: i32,
    pub y: i32,
    pub supertick_id: u64,
    pub actor_id: ActorId,
    pub old_color: Option<String>,
    pub new_color: String,
    pub action_type: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_timeout_is_a_wait_intent() {
        let e = JournalEntry::synthesize_timeout(3, ActorId::new("b"), Utc::now());
        assert_eq!(e.intent, Intent::Wait);
        assert_eq!(e.status, JournalStatus::Pending);
        assert!(e.result.is_none());
    }
}
