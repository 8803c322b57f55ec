//! Error type shared by the engine, loaders and the loan book

use thiserror::Error;

/// Errors raised at the engine boundary and by the file loaders
#[derive(Debug, Error)]
pub enum AmortizationError {
    #[error("invalid loan parameters: {field} ({reason})")]
    InvalidLoanParameters { field: String, reason: String },

    #[error("invalid extra payment for period {period}: {reason}")]
    InvalidExtraPayment { period: u32, reason: String },

    #[error("invalid date: {0}")]
    Date(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl AmortizationError {
    pub(crate) fn loan(field: &str, reason: impl Into<String>) -> Self {
        AmortizationError::InvalidLoanParameters {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn extra(period: u32, reason: impl Into<String>) -> Self {
        AmortizationError::InvalidExtraPayment {
            period,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AmortizationError>;
