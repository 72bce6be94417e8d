use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle of the live round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    #[default]
    Idle,
    Running,
    #[serde(rename = "cashed_out")]
    CashedOut,
    Crashed,
}

impl RoundStatus {
    /// A new round may be started from any state except `Running`
    pub fn accepts_start(self) -> bool {
        self != RoundStatus::Running
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundStatus::Idle => write!(f, "idle"),
            RoundStatus::Running => write!(f, "running"),
            RoundStatus::CashedOut => write!(f, "cashed out"),
            RoundStatus::Crashed => write!(f, "crashed"),
        }
    }
}

/// One crash point in the recent-history strip.
///
/// Field names match the browser storage format: `{ "crash": 2.41, "time": 1700000000000 }`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    #[serde(rename = "crash")]
    pub crash_point: f64,
    #[serde(rename = "time", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// A settled cash-out
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub username: String,
    pub wager: f64,
    #[serde(rename = "cashout")]
    pub cashout_multiplier: f64,
    #[serde(rename = "win")]
    pub win_amount: f64,
}

/// Registered player. Registration only checks that both fields are filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    username: String,
}

impl Player {
    pub fn register(username: &str, password: &str) -> Result<Self, crate::errors::RoundError> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(crate::errors::RoundError::InvalidRegistration);
        }
        Ok(Self {
            username: username.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Result of applying one tick to a running round
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Multiplier advanced, round still running
    Climbing { multiplier: f64 },
    /// Crash point reached; wager lost
    Crashed { crash_point: f64, multiplier: f64 },
    /// Auto cash-out threshold reached before the crash
    CashedOut(CashOutReceipt),
    /// Tick arrived for a round that is no longer live
    Ignored,
}

impl TickOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TickOutcome::Crashed { .. } | TickOutcome::CashedOut(_))
    }
}

/// Settlement details of a cash-out
#[derive(Debug, Clone, PartialEq)]
pub struct CashOutReceipt {
    pub round_id: Uuid,
    pub multiplier: f64,
    pub win_amount: f64,
    pub balance: f64,
}

/// Parameters a round was started with, kept for auto-restart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundParams {
    pub wager: f64,
    pub auto_cashout: f64,
}

/// Read-only view of the engine for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSnapshot {
    pub round_id: Option<Uuid>,
    pub status: RoundStatus,
    pub multiplier: f64,
    pub balance: f64,
    pub wager: f64,
    pub auto_cashout: f64,
    /// Only revealed once the round has crashed
    pub crash_point: Option<f64>,
    pub last_win: f64,
    pub rounds_played: u64,
    pub cashouts: u64,
    pub admin: bool,
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
