//! Room lifecycle and intent dispatch for Cannon Blitz.
//!
//! This crate sits between a transport (anything that moves JSON lines) and the
//! match engine:
//!
//! - [`SessionRegistry`] - Live rooms keyed by [`RoomCode`], one lock per room
//! - [`Room`] - A match, its attached connections and its optional scripted
//!   opponent
//! - [`Hub`] - Authenticates connections and turns [`ClientMessage`]s into
//!   engine operations, queueing [`ServerMessage`]s on each connection's outbox
//! - [`TokenVerifier`] - Identity boundary for the `authenticate` intent
//!
//! The hub never performs I/O itself. Every connection owns an unbounded
//! outbox; the transport drains it on its own task, so a slow socket never
//! holds a room lock.

pub use self::{auth::*, error::*, hub::*, protocol::*, registry::*, room::*};

mod auth;
mod error;
mod hub;
mod protocol;
mod registry;
mod room;
