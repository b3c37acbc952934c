//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`InsufficientStock`] thrown when a decrement would take a stock entry
//!   below zero.
//! - [`LinkedDetail`] thrown when a detail line referenced by another record
//!   is updated or deleted.
//! - [`KeyNotFound`] thrown when an item is not found.
//!
//!  [`InsufficientStock`]: EngineError::InsufficientStock
//!  [`LinkedDetail`]: EngineError::LinkedDetail
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::lock::LockReason;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient stock for supply {supply_id}: {available} available, {requested} requested")]
    InsufficientStock {
        supply_id: Uuid,
        available: i64,
        requested: i64,
    },
    #[error("Detail {detail_id} is referenced by another record: {reason}")]
    LinkedDetail { detail_id: Uuid, reason: LockReason },
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::InsufficientStock {
                    supply_id: a,
                    available: b,
                    requested: c,
                },
                Self::InsufficientStock {
                    supply_id: x,
                    available: y,
                    requested: z,
                },
            ) => a == x && b == y && c == z,
            (
                Self::LinkedDetail {
                    detail_id: a,
                    reason: b,
                },
                Self::LinkedDetail {
                    detail_id: x,
                    reason: y,
                },
            ) => a == x && b == y,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidQuantity(a), Self::InvalidQuantity(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
