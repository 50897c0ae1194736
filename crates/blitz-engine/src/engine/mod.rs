//! Match rules and state management.
//!
//! This module implements a two-player artillery match on top of the grid
//! primitives in [`crate::core`]:
//!
//! - [`MatchState`] - Players, owned bases, phase, turn pointer and last action
//! - [`MatchEngine`] - The only way to mutate a [`MatchState`]; enforces the
//!   phase and turn state machine
//! - [`Status`] - Outcome of every engine operation, rendered as a human string
//! - [`Snapshot`] - Full serializable view of a match, pushed to clients
//! - [`MatchSeed`] - Seed for deterministic matches
//!
//! # Match Flow
//!
//! 1. Two players [`join`](MatchEngine::join) in the `lobby` phase
//! 2. Both mark themselves ready, moving the match to `placement`
//! 3. Each player places `max_bases` bases; the match moves to `battle` and a
//!    random player gets the first turn
//! 4. Players alternate shots (or buy extra bases) until one side has no bases
//!    left, at which point the match is `ended`
//!
//! Rule violations never fail: every operation returns a [`Status`], and a
//! rejected operation leaves the state untouched apart from the recorded status.
//!
//! # Example
//!
//! ```
//! use blitz_engine::{MatchConfig, MatchEngine, Phase};
//!
//! let mut engine = MatchEngine::with_seed(MatchConfig::default(), rand::random());
//! let a = engine.join("Alice").unwrap();
//! let b = engine.join("Bob").unwrap();
//!
//! engine.set_ready(a, true);
//! engine.set_ready(b, true);
//! assert_eq!(engine.state().phase(), Phase::Placement);
//! ```

pub use self::{
    match_engine::*, match_state::*, player::*, seed::*, shot::*, snapshot::*, status::*,
};

mod match_engine;
mod match_state;
mod player;
mod seed;
mod shot;
mod snapshot;
mod status;
