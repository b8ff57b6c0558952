//! Row <-> domain type conversions shared by [`crate::store`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use monument_world::{Actor, ActorId, Direction, Intent, Outcome, Scope, TileColor};

use crate::error::StoreError;

pub(crate) fn direction_to_str(d: Direction) -> &'static str {
    match d {
        Direction::N => "N",
        Direction::S => "S",
        Direction::E => "E",
        Direction::W => "W",
    }
}

pub(crate) fn direction_from_str(s: &str) -> Result<Direction, StoreError> {
    match s {
        "N" => Ok(Direction::N),
        "S" => Ok(Direction::S),
        "E" => Ok(Direction::E),
        "W" => Ok(Direction::W),
        other => Err(StoreError::Corrupt(format!("invalid direction {other:?}"))),
    }
}

pub(crate) fn scopes_to_json(scopes: &BTreeSet<Scope>) -> String {
    serde_json::to_string(scopes).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn scopes_from_json(raw: &str) -> Result<BTreeSet<Scope>, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt(format!("scopes: {e}")))
}

pub(crate) fn intent_to_json(intent: &Intent) -> String {
    serde_json::to_string(intent).unwrap_or_else(|_| "null".to_string())
}

pub(crate) fn intent_from_json(raw: &str) -> Result<Intent, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt(format!("intent: {e}")))
}

pub(crate) fn outcome_to_str(outcome: Outcome) -> &'static str {
    outcome.as_str()
}

pub(crate) fn outcome_from_str(s: &str) -> Result<Outcome, StoreError> {
    match s {
        "SUCCESS" => Ok(Outcome::Success),
        "INVALID" => Ok(Outcome::Invalid),
        "CONFLICT_LOST" => Ok(Outcome::ConflictLost),
        "TIMEOUT" => Ok(Outcome::Timeout),
        "NO_OP" => Ok(Outcome::NoOp),
        other => Err(StoreError::Corrupt(format!("invalid outcome {other:?}"))),
    }
}

pub(crate) fn timestamp_to_str(t: DateTime<Utc>) -> String {
    t.to_rfc3339()
}

pub(crate) fn timestamp_from_str(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp {s:?}: {e}")))
}

pub(crate) fn color_to_str(c: TileColor) -> String {
    c.to_hex()
}

pub(crate) fn color_from_str(s: &str) -> Result<TileColor, StoreError> {
    TileColor::parse(s).map_err(|e| StoreError::Corrupt(e.to_string()))
}

pub(crate) fn actor_from_row(
    id: String,
    secret: String,
    x: i32,
    y: i32,
    facing: String,
    scopes: String,
    custom_instructions: String,
    eliminated_at: Option<String>,
) -> Result<Actor, StoreError> {
    let eliminated_at = eliminated_at.map(|s| timestamp_from_str(&s)).transpose()?;
    Ok(Actor {
        id: ActorId::new(id),
        secret,
        x,
        y,
        facing: direction_from_str(&facing)?,
        scopes: scopes_from_json(&scopes)?,
        custom_instructions,
        eliminated_at,
    })
}
