//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`CurrencyMismatch`] thrown when a cash entry disagrees with its register
//!   or with the document currency.
//! - [`InvalidState`] thrown when a document is in the wrong lifecycle state.
//! - [`AlreadyConfirmed`] thrown when confirming a confirmed document.
//! - [`InsufficientStock`] thrown when a production consumes more than the
//!   available stock.
//! - [`KeyNotFound`] thrown when an item are not found.
//!
//!  [`CurrencyMismatch`]: EngineError::CurrencyMismatch
//!  [`InvalidState`]: EngineError::InvalidState
//!  [`AlreadyConfirmed`]: EngineError::AlreadyConfirmed
//!  [`InsufficientStock`]: EngineError::InsufficientStock
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Already confirmed: {0}")]
    AlreadyConfirmed(String),
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::AlreadyConfirmed(a), Self::AlreadyConfirmed(b)) => a == b,
            (Self::InsufficientStock(a), Self::InsufficientStock(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
