use chrono::NaiveDate;
use hourglass_rs::{SafeTimeProvider, TimeSource};
use std::sync::Mutex;
use uuid::Uuid;

use crate::allocation::AllocationEngine;
use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::Ledger;
use crate::loan::{Loan, LoanAggregate, ReceivedPayment, ScheduledInstallment};
use crate::schedule::ScheduleGenerator;
use crate::types::{BorrowerId, Currency, InstallmentStatus, LoanId, LoanStatus};

/// core engine: creates loans with their amortization schedule and applies
/// incoming repayments against it. Both operations run as one atomic unit
/// against the ledger.
pub struct LoanEngine {
    config: EngineConfig,
    ledger: Ledger,
    events: Mutex<EventStore>,
}

impl LoanEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ledger: Ledger::new(),
            events: Mutex::new(EventStore::new()),
        }
    }

    /// engine with the canonical servicing configuration
    pub fn standard() -> Self {
        Self::new(EngineConfig::standard())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// snapshot of one loan and everything it owns
    pub fn loan(&self, id: LoanId) -> Result<LoanAggregate> {
        self.ledger.get(id)
    }

    /// drain events collected by completed operations
    pub fn take_events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|mut store| store.take_events())
            .unwrap_or_default()
    }

    /// create a loan and persist it together with its installment schedule;
    /// nothing is visible if any part fails
    pub fn create_loan(
        &self,
        borrower_id: BorrowerId,
        principal: Money,
        currency: Currency,
        term_count: u32,
        processed_at: NaiveDate,
        time: &SafeTimeProvider,
    ) -> Result<Loan> {
        let result =
            self.create_loan_inner(borrower_id, principal, currency, term_count, processed_at, time);
        if let Err(error) = &result {
            tracing::warn!(%error, "loan creation aborted");
        }
        result
    }

    /// create a loan stamped with system time
    pub fn create_loan_now(
        &self,
        borrower_id: BorrowerId,
        principal: Money,
        currency: Currency,
        term_count: u32,
        processed_at: NaiveDate,
    ) -> Result<Loan> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.create_loan(borrower_id, principal, currency, term_count, processed_at, &time)
    }

    fn create_loan_inner(
        &self,
        borrower_id: BorrowerId,
        principal: Money,
        currency: Currency,
        term_count: u32,
        processed_at: NaiveDate,
        time: &SafeTimeProvider,
    ) -> Result<Loan> {
        let generator = ScheduleGenerator::new(self.config.rounding_policy);
        let specs = generator.generate(principal, term_count, currency, processed_at)?;

        let loan = Loan {
            id: Uuid::new_v4(),
            borrower_id,
            principal,
            outstanding_balance: principal,
            term_count,
            currency,
            start_date: processed_at,
            status: LoanStatus::Due,
            created_at: time.now(),
        };

        let installments: Vec<ScheduledInstallment> = specs
            .into_iter()
            .map(|spec| ScheduledInstallment::from_spec(loan.id, spec))
            .collect();
        let first_due = installments.first().map(|i| i.due_date);
        let last_due = installments.last().map(|i| i.due_date);
        tracing::debug!(
            loan_id = %loan.id,
            installment_count = installments.len(),
            "schedule staged"
        );

        let aggregate = LoanAggregate {
            loan: loan.clone(),
            installments,
            payments: Vec::new(),
        };
        self.ledger.insert(aggregate)?;

        tracing::info!(
            loan_id = %loan.id,
            %principal,
            term_count,
            %currency,
            "loan persisted with schedule"
        );

        let mut events = vec![Event::LoanCreated {
            loan_id: loan.id,
            borrower_id,
            principal,
            currency,
            term_count,
            timestamp: loan.created_at,
        }];
        if let (Some(first_due), Some(last_due)) = (first_due, last_due) {
            events.push(Event::ScheduleGenerated {
                loan_id: loan.id,
                installment_count: term_count,
                first_due,
                last_due,
            });
        }
        self.emit_all(events);

        Ok(loan)
    }

    /// record a payment and allocate it across the loan's eligible
    /// installments from the earliest due date onward; one atomic unit
    pub fn apply_payment(
        &self,
        loan_id: LoanId,
        amount: Money,
        currency: Currency,
        received_at: NaiveDate,
        time: &SafeTimeProvider,
    ) -> Result<ReceivedPayment> {
        let result = self.apply_payment_inner(loan_id, amount, currency, received_at, time);
        if let Err(error) = &result {
            tracing::warn!(%loan_id, %error, "payment application aborted");
        }
        result
    }

    /// apply a payment stamped with system time
    pub fn apply_payment_now(
        &self,
        loan_id: LoanId,
        amount: Money,
        currency: Currency,
        received_at: NaiveDate,
    ) -> Result<ReceivedPayment> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.apply_payment(loan_id, amount, currency, received_at, &time)
    }

    fn apply_payment_inner(
        &self,
        loan_id: LoanId,
        amount: Money,
        currency: Currency,
        received_at: NaiveDate,
        time: &SafeTimeProvider,
    ) -> Result<ReceivedPayment> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidPaymentAmount { amount });
        }

        let allocator = AllocationEngine::new(self.config.allocation_policy);
        let now = time.now();
        let payment_id = Uuid::new_v4();

        let (payment, outcome, loan_after, became_repaid) =
            self.ledger.update(loan_id, |aggregate| {
                if aggregate.loan.currency != currency {
                    return Err(EngineError::CurrencyMismatch {
                        expected: aggregate.loan.currency,
                        actual: currency,
                    });
                }

                // the payment is recorded in full even when it exceeds the
                // outstanding debt; the surplus is simply never consumed
                let payment = ReceivedPayment {
                    id: payment_id,
                    loan_id,
                    amount,
                    currency,
                    received_at,
                    created_at: now,
                };
                aggregate.payments.push(payment.clone());

                let outcome = allocator.allocate(&aggregate.installments, amount);
                for updated in &outcome.touched {
                    let slot = aggregate
                        .installments
                        .iter_mut()
                        .find(|i| i.id == updated.id)
                        .ok_or_else(|| EngineError::InvariantViolation {
                            message: format!("allocated installment {} missing from loan", updated.id),
                        })?;
                    *slot = updated.clone();
                }

                let was_repaid = aggregate.loan.status == LoanStatus::Repaid;
                aggregate.loan.outstanding_balance = aggregate.outstanding_total();
                if aggregate.loan.outstanding_balance.is_zero() {
                    aggregate.loan.status = LoanStatus::Repaid;
                }
                let became_repaid = !was_repaid && aggregate.loan.status == LoanStatus::Repaid;

                Ok((payment, outcome, aggregate.loan.clone(), became_repaid))
            })?;

        tracing::info!(
            %loan_id,
            payment_id = %payment.id,
            %amount,
            consumed = %outcome.consumed,
            discarded = %outcome.discarded,
            outstanding = %loan_after.outstanding_balance,
            "payment persisted"
        );

        let mut events = vec![Event::PaymentReceived {
            loan_id,
            payment_id: payment.id,
            amount,
            consumed: outcome.consumed,
            discarded: outcome.discarded,
            timestamp: now,
        }];
        for updated in &outcome.touched {
            match updated.status {
                InstallmentStatus::Repaid => events.push(Event::InstallmentSettled {
                    loan_id,
                    installment_id: updated.id,
                    due_date: updated.due_date,
                    timestamp: now,
                }),
                InstallmentStatus::Partial => events.push(Event::InstallmentPartiallySettled {
                    loan_id,
                    installment_id: updated.id,
                    due_date: updated.due_date,
                    remaining: updated.outstanding_balance,
                    timestamp: now,
                }),
                InstallmentStatus::Due => {}
            }
        }
        if became_repaid {
            events.push(Event::LoanRepaid {
                loan_id,
                timestamp: now,
            });
        }
        self.emit_all(events);

        Ok(payment)
    }

    fn emit_all(&self, new_events: Vec<Event>) {
        if let Ok(mut store) = self.events.lock() {
            for event in new_events {
                store.emit(event);
            }
        }
    }
}
