//! # monument-wire
//!
//! The HTTP/WS wire contract shared by the server and its clients:
//! request/response DTOs, the action grammar parser (spec §6), and the
//! error taxonomy with its HTTP status mapping (spec §7).
//!
//! This crate depends only on `monument-world` — never on `monument-
//! engine` or `monument-store` — so the wire contract stays a pure
//! description of "what goes over HTTP", reusable by a client without
//! pulling in the engine.

pub mod action;
pub mod dto;
mod error;

pub use error::ApiError;
