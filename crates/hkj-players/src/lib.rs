//! The scripted opponent that fills the second seat in NPC rooms.
//!
//! The machine interacts with the rule engine exactly like a human: it
//! submits ordinary [`Play`](hkj_engine::Play) values that go through the
//! same validation, and its think time is a scheduled message into the room
//! mailbox rather than a sleep inside it.
//!
//! ## Types
//!
//! - [`Difficulty`] — Five strength tiers controlling latency and policy
//! - [`Machine`] — The [`Opponent`] implementation
//! - [`Snapshot`] — Per-geisha standing the policies evaluate over
mod difficulty;
mod machine;
mod utility;

pub use difficulty::*;
pub use machine::*;
pub use utility::*;
