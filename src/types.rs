use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::EngineError;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a scheduled installment
pub type InstallmentId = Uuid;

/// unique identifier for a received payment
pub type PaymentId = Uuid;

/// reference to the borrower owning a loan; borrowers live outside the engine
pub type BorrowerId = Uuid;

/// currency codes recognized by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    SGD,
    VND,
}

impl Currency {
    /// iso-style code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::SGD => "SGD",
            Currency::VND => "VND",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SGD" => Ok(Currency::SGD),
            "VND" => Ok(Currency::VND),
            other => Err(EngineError::UnknownCurrency {
                code: other.to_string(),
            }),
        }
    }
}

/// loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// outstanding balance remains
    Due,
    /// outstanding balance reached zero; terminal
    Repaid,
}

/// installment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentStatus {
    /// untouched, full amount outstanding
    Due,
    /// partially settled, balance strictly between zero and the amount
    Partial,
    /// fully settled; terminal
    Repaid,
}

/// which installments participate in the repayment waterfall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationPolicy {
    /// strictly-due installments only; partially settled ones are skipped
    /// on later payments. Kept for compatibility with existing servicing
    /// records.
    DueOnly,
    /// due and partially settled installments both absorb payments
    DueOrPartial,
}

/// how the principal split rounds per-installment amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundingPolicy {
    /// floor-division base for every installment before the last; the last
    /// absorbs the remainder
    RemainderLast,
    /// ceiling-division base; trailing installments shrink once the running
    /// total reaches the principal
    CeilingReduceLast,
}
