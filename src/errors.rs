use thiserror::Error;

use crate::decimal::Money;
use crate::types::{Currency, LoanId};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid principal: {amount}")]
    InvalidPrincipal {
        amount: Money,
    },

    #[error("invalid term count: {terms}")]
    InvalidTermCount {
        terms: u32,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("currency mismatch: loan is {expected}, payment is {actual}")]
    CurrencyMismatch {
        expected: Currency,
        actual: Currency,
    },

    #[error("unknown currency code: {code}")]
    UnknownCurrency {
        code: String,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: LoanId,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("persistence failure: {message}")]
    Persistence {
        message: String,
    },

    #[error("invariant violation: {message}")]
    InvariantViolation {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
