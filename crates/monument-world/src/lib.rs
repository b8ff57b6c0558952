//! # monument-world
//!
//! The data model shared by every layer of Monument: namespace
//! identifiers, actors, tiles, the in-memory `World`, and the
//! journal/audit/chat/scoring record types that the store persists.
//!
//! This crate performs no I/O — it is the vocabulary the store, engine,
//! and API crates all speak.

pub mod actor;
pub mod chat;
pub mod intent;
pub mod journal;
pub mod namespace;
pub mod scoring;
pub mod tile;
pub mod world;

pub use actor::{Actor, ActorId, Direction, Scope};
pub use chat::{ChatMessage, MAX_MESSAGE_LEN};
pub use intent::{Intent, Outcome};
pub use journal::{AuditRecord, JournalEntry, JournalStatus, TileHistoryEntry};
pub use namespace::{InvalidNamespace, Namespace};
pub use scoring::{LastAdjudication, ScoringRound};
pub use tile::{Coord, MalformedColor, TileColor};
pub use world::{Phase, Visibility, World};
