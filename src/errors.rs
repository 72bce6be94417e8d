//! Error types for the Aviator round engine
//!
//! One root error per crate with a nested enum per subsystem, so callers can
//! match on the layer that failed and still use `?` across layers.

use crate::game::types::RoundStatus;
use thiserror::Error;

/// Root error type for all Aviator operations
#[derive(Debug, Error)]
pub enum AviatorError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Key-value store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Rejected round operations
    #[error("Round error: {0}")]
    Round(#[from] RoundError),
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Missing required field: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Key-value store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Corrupted data: {0}")]
    CorruptedData(String),
}

/// Rejections raised by the round engine and its ledgers.
///
/// Every variant is recoverable: the engine state is left untouched when one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoundError {
    #[error("Invalid wager {wager:.2} (balance {balance:.2})")]
    InvalidWager { wager: f64, balance: f64 },

    #[error("Invalid auto cash-out threshold {0}: must be at least 1.00")]
    InvalidAutoCashout(f64),

    #[error("Insufficient funds: requested {requested:.2}, available {available:.2}")]
    InsufficientFunds { requested: f64, available: f64 },

    #[error("Invalid amount {0}")]
    InvalidAmount(f64),

    #[error("Cannot {operation} while round is {status}")]
    InvalidState {
        operation: &'static str,
        status: RoundStatus,
    },

    #[error("Wrong admin password")]
    InvalidAdminSecret,

    #[error("Admin access required")]
    AdminAccessRequired,

    #[error("Deposits are disabled")]
    DepositsDisabled,

    #[error("Registration requires a username and password")]
    InvalidRegistration,
}

impl From<rocksdb::Error> for StorageError {
    fn from(e: rocksdb::Error) -> Self {
        StorageError::WriteFailed(e.to_string())
    }
}

/// Convenience type alias for Results
pub type AviatorResult<T> = Result<T, AviatorError>;
