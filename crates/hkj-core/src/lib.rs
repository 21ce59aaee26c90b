//! Core type aliases, traits, and constants for the hanamikoji server.
//!
//! This crate provides the foundational types and configuration parameters
//! used throughout the workspace.

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Charm points attached to a geisha (also her card count in the deck).
pub type Charm = u8;
/// Geisha identifier, 1..=7 within a game.
pub type GeishaId = u8;
/// Seat index at the table (0 = host seat).
pub type Position = usize;
/// Round counter within a game, starting at 1.
pub type Round = u32;
/// Client-supplied opaque player identity. Survives connection drops.
pub type PlayerId = String;
/// Six uppercase alphanumerics identifying a room.
pub type RoomCode = String;

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        uuid::Uuid::deserialize(deserializer).map(Self::from)
    }
}

// ============================================================================
// GAME PARAMETERS
// ============================================================================
/// Number of players at the table.
pub const N: usize = 2;
/// Number of geisha in a game.
pub const GEISHA_COUNT: usize = 7;
/// Charm values across the seven geisha, in catalog order.
pub const CHARMS: [Charm; GEISHA_COUNT] = [2, 2, 2, 3, 3, 4, 5];
/// Total charm across the catalog (also the deck size).
pub const CHARM_TOTAL: Charm = 21;
/// Cards in a fresh deck: one per charm point.
pub const DECK_SIZE: usize = 21;
/// Cards dealt to each seat at round start.
pub const HAND_SIZE: usize = 6;
/// Draw pile size after the removal and the opening deal.
pub const DRAW_PILE_SIZE: usize = DECK_SIZE - 1 - N * HAND_SIZE;
/// Action tokens per seat per round.
pub const TOKEN_COUNT: usize = 4;
/// Charm threshold that wins the game.
pub const CHARM_TO_WIN: Charm = 11;
/// Controlled-geisha threshold that wins the game.
pub const TOKENS_TO_WIN: u8 = 4;

// ============================================================================
// TIMING
// ============================================================================
/// Pause between the second seat arriving and the order announcement.
pub const ORDER_GRACE: std::time::Duration = std::time::Duration::from_millis(800);
/// Suspense between the order announcement and the random reveal.
pub const ORDER_REVEAL: std::time::Duration = std::time::Duration::from_millis(2000);
/// Pause between round resolution and the next round's deal.
pub const ROUND_PAUSE: std::time::Duration = std::time::Duration::from_millis(2500);
/// Default room snapshot lifetime in seconds.
pub const ROOM_TTL_SECONDS: u64 = 3600;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Install the process-wide terminal logger. Verbosity follows `APP_ENV`:
/// info in production, debug everywhere else.
pub fn log() {
    let level = match std::env::var("APP_ENV").as_deref() {
        Ok("production") => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    let config = simplelog::ConfigBuilder::new()
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    simplelog::TermLogger::init(
        level,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .expect("logger installs once per process");
}

/// Exit on ctrl-c without draining in-flight work. Rooms come back from
/// their snapshots, so there is nothing worth a graceful drain.
pub fn trap_interrupt() {
    tokio::spawn(async {
        tokio::signal::ctrl_c().await.expect("ctrl-c handler installs");
        log::warn!("ctrl-c received, shutting down");
        std::process::exit(0);
    });
}
