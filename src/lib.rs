//! Aviator - crash-game round engine
//!
//! A multiplier climbs from 1.00 on a fixed tick until it reaches a crash
//! point fixed at round start. The player cashes out before the crash, by
//! hand or through an auto cash-out threshold, to win wager x multiplier.
//!
//! [`game::RoundEngine`] is the synchronous state machine; [`game::RoundDriver`]
//! drives it from a tokio timer. Crash history and the leaderboard persist
//! through a [`storage::KeyValueStore`].

pub mod config;
pub mod errors;
pub mod game;
pub mod storage;

pub use config::{ConfigLoader, GameConfig};
pub use errors::{AviatorError, AviatorResult, RoundError};
pub use game::{Player, RoundDriver, RoundEngine, RoundSnapshot, RoundStatus};
