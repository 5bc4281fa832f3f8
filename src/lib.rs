pub mod allocation;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod loan;
pub mod schedule;
pub mod serialization;
pub mod types;

// re-export key types
pub use allocation::{AllocationEngine, AllocationOutcome};
pub use config::EngineConfig;
pub use decimal::Money;
pub use engine::LoanEngine;
pub use errors::{EngineError, Result};
pub use events::{Event, EventStore};
pub use ledger::Ledger;
pub use loan::{Loan, LoanAggregate, ReceivedPayment, ScheduledInstallment};
pub use schedule::{split_principal, InstallmentSpec, ScheduleGenerator};
pub use serialization::LoanView;
pub use types::{
    AllocationPolicy, BorrowerId, Currency, InstallmentId, InstallmentStatus, LoanId, LoanStatus,
    PaymentId, RoundingPolicy,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
