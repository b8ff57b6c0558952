//! # monument-store
//!
//! The per-namespace embedded relational store: one SQLite database file
//! per namespace, a fixed versioned schema with no migrations, and an
//! atomic unit-of-work transaction used to commit a tick's effects.

mod convert;
mod error;
mod schema;
mod store;

pub use error::StoreError;
pub use schema::SCHEMA_VERSION;
pub use store::{NamespaceDefaults, Store, TickTxn};
