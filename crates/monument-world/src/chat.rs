//! Chat log entries appended by `SPEAK` intents.

use chrono::{DateTime, Utc};

use crate::actor::ActorId;

/// Maximum `SPEAK` message length, in bytes.
pub const MAX_MESSAGE_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    pub supertick_id: u64,
    pub from_id: ActorId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
