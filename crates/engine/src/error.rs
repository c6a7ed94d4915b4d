//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidAmount`] thrown when a money amount is negative or malformed.
//! - [`InvalidDate`] thrown when a stored or supplied date does not parse.
//! - [`KeyNotFound`] thrown when an item is not found.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidDate`]: EngineError::InvalidDate
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Remote mirror error: {0}")]
    Remote(String),
    #[error(transparent)]
    Storage(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidSettings(a), Self::InvalidSettings(b)) => a == b,
            (Self::InvalidTransaction(a), Self::InvalidTransaction(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Remote(a), Self::Remote(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.kind() == b.kind(),
            (Self::Serialization(a), Self::Serialization(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
