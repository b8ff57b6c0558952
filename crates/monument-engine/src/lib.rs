//! # monument-engine
//!
//! The tick state machine: the per-namespace actor that serializes
//! submissions and drives SNAPSHOT → COLLECT → MERGE → BROADCAST (spec
//! §4.3), the action validator (§4.4–§4.5), the deterministic merge
//! resolver (§4.6), the context builder (§4.7), and the frozen snapshot
//! that ties all three to one hashed staleness token (§9).
//!
//! This crate depends on `monument-world` (the data model) and
//! `monument-store` (persistence) but knows nothing about HTTP — that
//! boundary is `monument-wire` and `monument-api`.

mod context;
mod error;
mod merge;
mod namespace;
mod snapshot;
mod validator;

pub use context::{build_hud, HudPayload, LastTickResult, VisibleActor};
pub use error::EngineError;
pub use merge::{priority_key, resolve_tick, ActorEffect, MergeResult};
pub use namespace::{spawn, NamespaceConfig, NamespaceEvent, NamespaceHandle, ScoringRoundInput};
pub use snapshot::FrozenSnapshot;
pub use validator::{validate_submission, ActionSubmission};
