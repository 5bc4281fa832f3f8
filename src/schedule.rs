use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::types::{Currency, RoundingPolicy};

/// one scheduled obligation produced by the generator, before ids are assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallmentSpec {
    /// whole months after the processing date; the first installment is 1
    pub month_offset: u32,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub currency: Currency,
}

/// schedule generator
pub struct ScheduleGenerator {
    rounding: RoundingPolicy,
}

impl ScheduleGenerator {
    pub fn new(rounding: RoundingPolicy) -> Self {
        Self { rounding }
    }

    /// split a principal over a term into monthly installments whose amounts
    /// sum exactly to the principal. Due dates start one month after the
    /// processing date, never on it.
    pub fn generate(
        &self,
        principal: Money,
        term_count: u32,
        currency: Currency,
        start_date: NaiveDate,
    ) -> Result<Vec<InstallmentSpec>> {
        if !principal.is_positive() {
            return Err(EngineError::InvalidPrincipal { amount: principal });
        }
        if term_count == 0 {
            return Err(EngineError::InvalidTermCount { terms: term_count });
        }

        let amounts = split_principal(principal, term_count, self.rounding);

        let mut specs = Vec::with_capacity(term_count as usize);
        for (index, amount) in amounts.into_iter().enumerate() {
            let month_offset = index as u32 + 1;
            specs.push(InstallmentSpec {
                month_offset,
                amount,
                due_date: add_months(start_date, month_offset)?,
                currency,
            });
        }

        Ok(specs)
    }
}

/// split a principal into `term_count` whole parts summing exactly to the
/// principal; the single place any rounding rule lives
pub fn split_principal(principal: Money, term_count: u32, rounding: RoundingPolicy) -> Vec<Money> {
    let total = principal.as_decimal();
    let terms = Decimal::from(term_count);

    match rounding {
        RoundingPolicy::RemainderLast => {
            let base = (total / terms).floor();
            let mut parts = vec![Money::from_decimal(base); (term_count - 1) as usize];
            parts.push(Money::from_decimal(total - base * (terms - Decimal::ONE)));
            parts
        }
        RoundingPolicy::CeilingReduceLast => {
            let base = (total / terms).ceil();
            let mut undistributed = total;
            let mut parts = Vec::with_capacity(term_count as usize);
            for _ in 0..term_count {
                let part = base.min(undistributed);
                undistributed -= part;
                parts.push(Money::from_decimal(part));
            }
            parts
        }
    }
}

/// advance a calendar date by whole months, clamping to the end of shorter
/// months
fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| EngineError::InvalidDate {
            message: format!("{date} plus {months} months is out of range"),
        })
}
