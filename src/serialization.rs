/// serialization support for loan state
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::loan::LoanAggregate;
use crate::types::{
    BorrowerId, Currency, InstallmentId, InstallmentStatus, LoanId, LoanStatus, PaymentId,
};

/// serializable view of a loan, its schedule, and its payment history
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub borrower_id: BorrowerId,
    pub status: LoanStatus,
    pub currency: Currency,
    pub start_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub financial: FinancialView,
    pub schedule: Vec<InstallmentView>,
    pub payments: Vec<PaymentView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FinancialView {
    pub principal: Money,
    pub outstanding_balance: Money,
    pub term_count: u32,
    pub total_received: Money,
    pub open_installments: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InstallmentView {
    pub id: InstallmentId,
    pub due_date: NaiveDate,
    pub amount: Money,
    pub outstanding_balance: Money,
    pub status: InstallmentStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentView {
    pub id: PaymentId,
    pub amount: Money,
    pub received_at: NaiveDate,
}

impl LoanView {
    pub fn from_aggregate(aggregate: &LoanAggregate) -> Self {
        LoanView {
            id: aggregate.loan.id,
            borrower_id: aggregate.loan.borrower_id,
            status: aggregate.loan.status,
            currency: aggregate.loan.currency,
            start_date: aggregate.loan.start_date,
            created_at: aggregate.loan.created_at,
            financial: FinancialView {
                principal: aggregate.loan.principal,
                outstanding_balance: aggregate.loan.outstanding_balance,
                term_count: aggregate.loan.term_count,
                total_received: aggregate.total_received(),
                open_installments: aggregate.open_installments().len() as u32,
            },
            schedule: aggregate
                .installments
                .iter()
                .map(|installment| InstallmentView {
                    id: installment.id,
                    due_date: installment.due_date,
                    amount: installment.amount,
                    outstanding_balance: installment.outstanding_balance,
                    status: installment.status,
                })
                .collect(),
            payments: aggregate
                .payments
                .iter()
                .map(|payment| PaymentView {
                    id: payment.id,
                    amount: payment.amount,
                    received_at: payment.received_at,
                })
                .collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::LoanEngine;
    use chrono::TimeZone;
    use hourglass_rs::{SafeTimeProvider, TimeSource};
    use uuid::Uuid;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn test_view_reflects_aggregate_state() {
        let engine = LoanEngine::new(EngineConfig::standard());
        let time = test_time();
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        let loan = engine
            .create_loan(Uuid::new_v4(), Money::from_major(300), Currency::SGD, 3, start, &time)
            .unwrap();
        engine
            .apply_payment(
                loan.id,
                Money::from_major(150),
                Currency::SGD,
                NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
                &time,
            )
            .unwrap();

        let aggregate = engine.loan(loan.id).unwrap();
        let view = LoanView::from_aggregate(&aggregate);

        assert_eq!(view.financial.outstanding_balance, Money::from_major(150));
        assert_eq!(view.financial.total_received, Money::from_major(150));
        assert_eq!(view.financial.open_installments, 2);
        assert_eq!(view.schedule.len(), 3);
        assert_eq!(view.payments.len(), 1);

        let json = view.to_json_pretty().unwrap();
        assert!(json.contains("\"outstanding_balance\""));
    }

    #[test]
    fn test_aggregate_json_round_trip() {
        let engine = LoanEngine::new(EngineConfig::standard());
        let time = test_time();
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let loan = engine
            .create_loan(Uuid::new_v4(), Money::from_major(1000), Currency::VND, 4, start, &time)
            .unwrap();

        let aggregate = engine.loan(loan.id).unwrap();
        let json = serde_json::to_string(&aggregate).unwrap();
        let restored: LoanAggregate = serde_json::from_str(&json).unwrap();

        restored.check_invariants().unwrap();
        assert_eq!(restored.loan.id, aggregate.loan.id);
        assert_eq!(restored.installments, aggregate.installments);
    }
}
