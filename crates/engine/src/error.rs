//! The module contains the errors the engine can throw.
//!
//! Split validation failures have their own taxonomy ([`SplitError`]) and are
//! wrapped transparently so callers can still match on the exact kind.

use sea_orm::DbErr;
use thiserror::Error;

use crate::split::SplitError;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0} not found")]
    KeyNotFound(String),
    #[error("{0} already exists")]
    ExistingKey(String),
    /// A referenced category/group does not exist or belongs to another user.
    ///
    /// Distinct from [`KeyNotFound`]: a bad reference inside a payload is a
    /// validation failure, not a missing resource.
    ///
    /// [`KeyNotFound`]: EngineError::KeyNotFound
    #[error("invalid reference: {0}")]
    InvalidReference(String),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidReference(a), Self::InvalidReference(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Split(a), Self::Split(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
