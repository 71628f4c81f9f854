//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when a name, price or quantity is malformed.
//! - [`KeyNotFound`] thrown when a list or an item does not exist.
//! - [`ConsistencyDrift`] thrown when the expense mirror disagrees with the
//!   budget stored for a list.
//! - [`Mirror`] thrown when the secondary expense store cannot be read or
//!   written.
//! - [`Database`] thrown when the store of record fails. Every multi-row
//!   operation is rolled back before this error reaches the caller.
//!
//! A toggle on an item without a price is not an error: see
//! [`ToggleOutcome::PriceRequired`].
//!
//!  [`Validation`]: EngineError::Validation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ConsistencyDrift`]: EngineError::ConsistencyDrift
//!  [`Mirror`]: EngineError::Mirror
//!  [`Database`]: EngineError::Database
//!  [`ToggleOutcome::PriceRequired`]: crate::ToggleOutcome::PriceRequired
use sea_orm::DbErr;
use thiserror::Error;

use crate::MoneyCents;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error(
        "Consistency drift on list {list_id}: mirror counts {mirror_spent}, items count {expected_spent}, budget stores {stored_current} instead of {expected_current}"
    )]
    ConsistencyDrift {
        list_id: String,
        expected_spent: MoneyCents,
        mirror_spent: MoneyCents,
        stored_current: MoneyCents,
        expected_current: MoneyCents,
    },
    #[error("Expense mirror error: {0}")]
    Mirror(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` for errors raised before anything was written.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (
                Self::ConsistencyDrift {
                    list_id: a,
                    expected_spent: a_spent,
                    mirror_spent: a_mirror,
                    stored_current: a_stored,
                    expected_current: a_expected,
                },
                Self::ConsistencyDrift {
                    list_id: b,
                    expected_spent: b_spent,
                    mirror_spent: b_mirror,
                    stored_current: b_stored,
                    expected_current: b_expected,
                },
            ) => {
                a == b
                    && a_spent == b_spent
                    && a_mirror == b_mirror
                    && a_stored == b_stored
                    && a_expected == b_expected
            }
            (Self::Mirror(a), Self::Mirror(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
