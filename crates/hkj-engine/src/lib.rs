//! Rule engine and round driver for the hanamikoji card game.
//!
//! The engine is a functional core over a single owned [`GameState`]: the
//! room actor (imperative shell) feeds it validated player input and
//! broadcasts the effects it reports back.
//!
//! ## Core Types
//!
//! - [`GameState`] — Canonical per-room game state
//! - [`Play`] — The six player-submitted operations
//! - [`Pending`] — An open two-phase interaction awaiting the opponent
//! - [`RuleError`] — Soft validation failures, reported to the actor only
//!
//! ## Driver
//!
//! - [`prepare_round`] — Deck rebuild, token reset, alternating deal
//! - [`begin_turn`] / [`advance_turn`] — Turn sequencing
//! - [`resolve_round`] — Secret reveal, favor counting, scoring, victory
//!
//! ## Masking
//!
//! - [`masked`] — The only constructor of [`MaskedState`]; every outbound
//!   state frame goes through it
mod actions;
mod errors;
mod mask;
mod rounds;
mod rules;
mod state;

pub use actions::*;
pub use errors::*;
pub use mask::*;
pub use rounds::*;
pub use rules::*;
pub use state::*;
