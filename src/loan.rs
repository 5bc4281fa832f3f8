use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::schedule::InstallmentSpec;
use crate::types::{
    BorrowerId, Currency, InstallmentId, InstallmentStatus, LoanId, LoanStatus, PaymentId,
};

/// loan header state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub borrower_id: BorrowerId,
    /// original amount lent; immutable after creation
    pub principal: Money,
    /// remaining unpaid portion across non-repaid installments
    pub outstanding_balance: Money,
    pub term_count: u32,
    pub currency: Currency,
    /// processing date; the first installment falls one month after it
    pub start_date: NaiveDate,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
}

/// one scheduled obligation of a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    /// original installment size; immutable after creation
    pub amount: Money,
    /// remaining unpaid portion, in `[0, amount]`
    pub outstanding_balance: Money,
    /// sole ordering key among a loan's installments
    pub due_date: NaiveDate,
    pub currency: Currency,
    pub status: InstallmentStatus,
}

impl ScheduledInstallment {
    /// materialize a generator spec for a loan
    pub fn from_spec(loan_id: LoanId, spec: InstallmentSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            amount: spec.amount,
            outstanding_balance: spec.amount,
            due_date: spec.due_date,
            currency: spec.currency,
            status: InstallmentStatus::Due,
        }
    }

    /// still carrying an unpaid balance
    pub fn is_open(&self) -> bool {
        self.status != InstallmentStatus::Repaid
    }
}

/// append-only audit record of one received payment, independent of how the
/// amount was distributed across installments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedPayment {
    pub id: PaymentId,
    pub loan_id: LoanId,
    /// full amount received in this payment event
    pub amount: Money,
    pub currency: Currency,
    pub received_at: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// a loan plus everything it owns; the unit the ledger persists atomically
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAggregate {
    pub loan: Loan,
    pub installments: Vec<ScheduledInstallment>,
    pub payments: Vec<ReceivedPayment>,
}

impl LoanAggregate {
    /// installments still carrying an unpaid balance, due date ascending
    pub fn open_installments(&self) -> Vec<&ScheduledInstallment> {
        let mut open: Vec<_> = self.installments.iter().filter(|i| i.is_open()).collect();
        open.sort_by_key(|i| i.due_date);
        open
    }

    /// strictly-due installments, due date ascending
    pub fn due_installments(&self) -> Vec<&ScheduledInstallment> {
        let mut due: Vec<_> = self
            .installments
            .iter()
            .filter(|i| i.status == InstallmentStatus::Due)
            .collect();
        due.sort_by_key(|i| i.due_date);
        due
    }

    /// sum of outstanding balances over non-repaid installments
    pub fn outstanding_total(&self) -> Money {
        self.installments
            .iter()
            .filter(|i| i.is_open())
            .map(|i| i.outstanding_balance)
            .sum()
    }

    /// total received across all payment records
    pub fn total_received(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// verify every cross-record consistency rule; commits are gated on this
    pub fn check_invariants(&self) -> Result<()> {
        let scheduled: Money = self.installments.iter().map(|i| i.amount).sum();
        if scheduled != self.loan.principal {
            return Err(violation(format!(
                "scheduled amounts {scheduled} do not sum to principal {}",
                self.loan.principal
            )));
        }

        let outstanding = self.outstanding_total();
        if self.loan.outstanding_balance != outstanding {
            return Err(violation(format!(
                "loan outstanding {} does not match installment total {outstanding}",
                self.loan.outstanding_balance
            )));
        }

        let repaid = self.loan.status == LoanStatus::Repaid;
        if repaid != self.loan.outstanding_balance.is_zero() {
            return Err(violation(format!(
                "loan status {:?} inconsistent with outstanding {}",
                self.loan.status, self.loan.outstanding_balance
            )));
        }

        for installment in &self.installments {
            if installment.loan_id != self.loan.id {
                return Err(violation(format!(
                    "installment {} belongs to another loan",
                    installment.id
                )));
            }
            if installment.currency != self.loan.currency {
                return Err(violation(format!(
                    "installment {} currency {} differs from loan currency {}",
                    installment.id, installment.currency, self.loan.currency
                )));
            }
            if installment.outstanding_balance.is_negative()
                || installment.outstanding_balance > installment.amount
            {
                return Err(violation(format!(
                    "installment {} outstanding {} outside [0, {}]",
                    installment.id, installment.outstanding_balance, installment.amount
                )));
            }
            let settled = installment.status == InstallmentStatus::Repaid;
            if settled != installment.outstanding_balance.is_zero() {
                return Err(violation(format!(
                    "installment {} status {:?} inconsistent with outstanding {}",
                    installment.id, installment.status, installment.outstanding_balance
                )));
            }
        }

        for window in self.installments.windows(2) {
            if window[0].due_date >= window[1].due_date {
                return Err(violation(format!(
                    "due dates not strictly ascending around {}",
                    window[1].due_date
                )));
            }
        }

        Ok(())
    }
}

fn violation(message: String) -> EngineError {
    EngineError::InvariantViolation { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduleGenerator;
    use crate::types::RoundingPolicy;

    fn aggregate(principal: i64, terms: u32) -> LoanAggregate {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let generator = ScheduleGenerator::new(RoundingPolicy::RemainderLast);
        let specs = generator
            .generate(Money::from_major(principal), terms, Currency::SGD, start)
            .unwrap();

        let loan = Loan {
            id: Uuid::new_v4(),
            borrower_id: Uuid::new_v4(),
            principal: Money::from_major(principal),
            outstanding_balance: Money::from_major(principal),
            term_count: terms,
            currency: Currency::SGD,
            start_date: start,
            status: LoanStatus::Due,
            created_at: Utc::now(),
        };
        let installments = specs
            .into_iter()
            .map(|spec| ScheduledInstallment::from_spec(loan.id, spec))
            .collect();

        LoanAggregate {
            loan,
            installments,
            payments: Vec::new(),
        }
    }

    #[test]
    fn test_fresh_aggregate_satisfies_invariants() {
        let aggregate = aggregate(1000, 3);
        aggregate.check_invariants().unwrap();
        assert_eq!(aggregate.outstanding_total(), Money::from_major(1000));
        assert_eq!(aggregate.due_installments().len(), 3);
    }

    #[test]
    fn test_mismatched_loan_outstanding_is_caught() {
        let mut aggregate = aggregate(1000, 3);
        aggregate.loan.outstanding_balance = Money::from_major(1);
        assert!(matches!(
            aggregate.check_invariants(),
            Err(EngineError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_repaid_status_requires_zero_outstanding() {
        let mut aggregate = aggregate(300, 3);
        aggregate.loan.status = LoanStatus::Repaid;
        assert!(aggregate.check_invariants().is_err());
    }

    #[test]
    fn test_installment_balance_above_amount_is_caught() {
        let mut aggregate = aggregate(300, 3);
        aggregate.installments[0].outstanding_balance = Money::from_major(500);
        aggregate.loan.outstanding_balance = aggregate.outstanding_total();
        assert!(aggregate.check_invariants().is_err());
    }

    #[test]
    fn test_due_installments_exclude_partial_and_repaid() {
        let mut aggregate = aggregate(300, 3);
        aggregate.installments[0].status = InstallmentStatus::Repaid;
        aggregate.installments[0].outstanding_balance = Money::ZERO;
        aggregate.installments[1].status = InstallmentStatus::Partial;
        aggregate.installments[1].outstanding_balance = Money::from_major(40);
        aggregate.loan.outstanding_balance = aggregate.outstanding_total();

        aggregate.check_invariants().unwrap();
        assert_eq!(aggregate.due_installments().len(), 1);
        assert_eq!(aggregate.open_installments().len(), 2);
        assert_eq!(aggregate.outstanding_total(), Money::from_major(140));
    }
}
