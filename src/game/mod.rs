//! Crash-game round engine and its collaborators

pub mod account;
pub mod crash_generator;
pub mod driver;
pub mod engine;
pub mod history;
pub mod leaderboard;
pub mod types;

pub use account::BalanceAccount;
pub use crash_generator::RandomCrashGenerator;
pub use driver::RoundDriver;
pub use engine::RoundEngine;
pub use history::HistoryLedger;
pub use leaderboard::Leaderboard;
pub use types::*;
