use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::errors::{EngineError, Result};
use crate::loan::LoanAggregate;
use crate::types::LoanId;

/// in-memory loan store. Every write stages a copy of the aggregate,
/// validates it, and swaps it in on commit, so a failed operation leaves
/// prior state untouched. Each aggregate sits behind its own lock:
/// operations on the same loan serialize, different loans proceed in
/// parallel.
#[derive(Default)]
pub struct Ledger {
    loans: RwLock<HashMap<LoanId, Arc<Mutex<LoanAggregate>>>>,
    fail_next_commits: AtomicU32,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// force the next `n` commits to fail; lets tests exercise rollback paths
    pub fn fail_next_commits(&self, n: u32) {
        self.fail_next_commits.store(n, Ordering::SeqCst);
    }

    fn commit_gate(&self) -> Result<()> {
        let pending = self
            .fail_next_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match pending {
            Ok(_) => Err(EngineError::Persistence {
                message: "injected commit failure".to_string(),
            }),
            Err(_) => Ok(()),
        }
    }

    /// persist a brand-new aggregate as one atomic unit
    pub fn insert(&self, aggregate: LoanAggregate) -> Result<()> {
        aggregate.check_invariants()?;
        self.commit_gate()?;

        let mut loans = self.loans.write().map_err(|_| poisoned())?;
        if loans.contains_key(&aggregate.loan.id) {
            return Err(EngineError::Persistence {
                message: format!("duplicate loan id {}", aggregate.loan.id),
            });
        }
        loans.insert(aggregate.loan.id, Arc::new(Mutex::new(aggregate)));
        Ok(())
    }

    /// load a snapshot of one aggregate
    pub fn get(&self, id: LoanId) -> Result<LoanAggregate> {
        let entry = self.entry(id)?;
        let guard = entry.lock().map_err(|_| poisoned())?;
        Ok(guard.clone())
    }

    /// run an update against one aggregate under its lock. The closure works
    /// on a staged copy; the copy becomes visible only if the closure, the
    /// invariant check, and the commit all succeed.
    pub fn update<F, T>(&self, id: LoanId, f: F) -> Result<T>
    where
        F: FnOnce(&mut LoanAggregate) -> Result<T>,
    {
        let entry = self.entry(id)?;
        let mut guard = entry.lock().map_err(|_| poisoned())?;

        let mut staged = guard.clone();
        let out = f(&mut staged)?;
        staged.check_invariants()?;
        self.commit_gate()?;

        *guard = staged;
        Ok(out)
    }

    pub fn contains(&self, id: LoanId) -> bool {
        self.loans
            .read()
            .map(|loans| loans.contains_key(&id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.loans.read().map(|loans| loans.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, id: LoanId) -> Result<Arc<Mutex<LoanAggregate>>> {
        let loans = self.loans.read().map_err(|_| poisoned())?;
        loans
            .get(&id)
            .cloned()
            .ok_or(EngineError::LoanNotFound { id })
    }
}

fn poisoned() -> EngineError {
    EngineError::Persistence {
        message: "ledger lock poisoned".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::loan::{Loan, ScheduledInstallment};
    use crate::schedule::ScheduleGenerator;
    use crate::types::{Currency, LoanStatus, RoundingPolicy};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn sample_aggregate() -> LoanAggregate {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let generator = ScheduleGenerator::new(RoundingPolicy::RemainderLast);
        let specs = generator
            .generate(Money::from_major(300), 3, Currency::SGD, start)
            .unwrap();

        let loan = Loan {
            id: Uuid::new_v4(),
            borrower_id: Uuid::new_v4(),
            principal: Money::from_major(300),
            outstanding_balance: Money::from_major(300),
            term_count: 3,
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
    fn test_insert_and_get_round_trip() {
        let ledger = Ledger::new();
        let aggregate = sample_aggregate();
        let id = aggregate.loan.id;

        ledger.insert(aggregate).unwrap();

        assert!(ledger.contains(id));
        assert_eq!(ledger.len(), 1);
        let loaded = ledger.get(id).unwrap();
        assert_eq!(loaded.loan.principal, Money::from_major(300));
    }

    #[test]
    fn test_missing_loan_reports_not_found() {
        let ledger = Ledger::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            ledger.get(id),
            Err(EngineError::LoanNotFound { id: missing }) if missing == id
        ));
    }

    #[test]
    fn test_update_commits_staged_copy() {
        let ledger = Ledger::new();
        let aggregate = sample_aggregate();
        let id = aggregate.loan.id;
        ledger.insert(aggregate).unwrap();

        ledger
            .update(id, |staged| {
                staged.installments[0].outstanding_balance = Money::ZERO;
                staged.installments[0].status = crate::types::InstallmentStatus::Repaid;
                staged.loan.outstanding_balance = staged.outstanding_total();
                Ok(())
            })
            .unwrap();

        let loaded = ledger.get(id).unwrap();
        assert_eq!(loaded.loan.outstanding_balance, Money::from_major(200));
    }

    #[test]
    fn test_failed_closure_leaves_state_untouched() {
        let ledger = Ledger::new();
        let aggregate = sample_aggregate();
        let id = aggregate.loan.id;
        ledger.insert(aggregate).unwrap();

        let result: Result<()> = ledger.update(id, |staged| {
            staged.loan.outstanding_balance = Money::ZERO;
            Err(EngineError::Persistence {
                message: "boom".to_string(),
            })
        });
        assert!(result.is_err());

        let loaded = ledger.get(id).unwrap();
        assert_eq!(loaded.loan.outstanding_balance, Money::from_major(300));
    }

    #[test]
    fn test_invariant_check_gates_commit() {
        let ledger = Ledger::new();
        let aggregate = sample_aggregate();
        let id = aggregate.loan.id;
        ledger.insert(aggregate).unwrap();

        let result = ledger.update(id, |staged| {
            // would desynchronize the loan header from its installments
            staged.loan.outstanding_balance = Money::from_major(7);
            Ok(())
        });
        assert!(matches!(
            result,
            Err(EngineError::InvariantViolation { .. })
        ));

        let loaded = ledger.get(id).unwrap();
        assert_eq!(loaded.loan.outstanding_balance, Money::from_major(300));
    }

    #[test]
    fn test_injected_commit_failure_rolls_back() {
        let ledger = Ledger::new();
        let aggregate = sample_aggregate();
        let id = aggregate.loan.id;
        ledger.insert(aggregate).unwrap();

        ledger.fail_next_commits(1);
        let result = ledger.update(id, |staged| {
            staged.installments[0].outstanding_balance = Money::ZERO;
            staged.installments[0].status = crate::types::InstallmentStatus::Repaid;
            staged.loan.outstanding_balance = staged.outstanding_total();
            Ok(())
        });
        assert!(matches!(result, Err(EngineError::Persistence { .. })));

        // prior state is fully intact and the next commit succeeds again
        let loaded = ledger.get(id).unwrap();
        assert_eq!(loaded.loan.outstanding_balance, Money::from_major(300));
        ledger.update(id, |_| Ok(())).unwrap();
    }

    #[test]
    fn test_injected_failure_blocks_insert_entirely() {
        let ledger = Ledger::new();
        let aggregate = sample_aggregate();
        let id = aggregate.loan.id;

        ledger.fail_next_commits(1);
        assert!(ledger.insert(aggregate).is_err());
        assert!(!ledger.contains(id));
        assert!(ledger.is_empty());
    }
}
