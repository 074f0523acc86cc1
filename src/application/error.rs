use thiserror::Error;

use crate::domain::{ExpenseId, LedgerError, ValidationError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid expense: {0}")]
    Validation(#[from] ValidationError),

    #[error("No expense at position {position} (ledger holds {len} expense(s))")]
    OutOfRange { position: usize, len: usize },

    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(err) => AppError::Validation(err),
            LedgerError::OutOfRange { position, len } => AppError::OutOfRange { position, len },
            LedgerError::NotFound(id) => AppError::ExpenseNotFound(id),
        }
    }
}
