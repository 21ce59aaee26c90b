//! Geisha catalog and deck construction.
//!
//! ## Core Types
//!
//! - [`Geisha`] — One of the seven favor targets, with charm and control
//! - [`GeishaSet`] — Named roster parameter selecting display names
//! - [`Card`] — A single favor card bound to one geisha
//! - [`Deck`] — A freshly shuffled draw pile with its face-down removed card
mod card;
mod deck;
mod geisha;

pub use card::*;
pub use deck::*;
pub use geisha::*;
