use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{BorrowerId, Currency, InstallmentId, LoanId, PaymentId};

/// all events that can be emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    LoanCreated {
        loan_id: LoanId,
        borrower_id: BorrowerId,
        principal: Money,
        currency: Currency,
        term_count: u32,
        timestamp: DateTime<Utc>,
    },
    ScheduleGenerated {
        loan_id: LoanId,
        installment_count: u32,
        first_due: NaiveDate,
        last_due: NaiveDate,
    },
    LoanRepaid {
        loan_id: LoanId,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentReceived {
        loan_id: LoanId,
        payment_id: PaymentId,
        amount: Money,
        consumed: Money,
        discarded: Money,
        timestamp: DateTime<Utc>,
    },
    InstallmentSettled {
        loan_id: LoanId,
        installment_id: InstallmentId,
        due_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    InstallmentPartiallySettled {
        loan_id: LoanId,
        installment_id: InstallmentId,
        due_date: NaiveDate,
        remaining: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
