use crate::decimal::Money;
use crate::loan::ScheduledInstallment;
use crate::types::{AllocationPolicy, InstallmentStatus};

/// outcome of running one payment through the waterfall
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationOutcome {
    /// updated snapshots of every installment the payment touched
    pub touched: Vec<ScheduledInstallment>,
    /// portion of the payment consumed against installments
    pub consumed: Money,
    /// portion left after the waterfall ended, discarded without error
    pub discarded: Money,
}

/// repayment allocator: consumes a payment against eligible installments
/// from the earliest due date onward
pub struct AllocationEngine {
    policy: AllocationPolicy,
}

impl AllocationEngine {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self { policy }
    }

    /// installments eligible for the waterfall under this policy, due date
    /// ascending
    pub fn eligible<'a>(
        &self,
        installments: &'a [ScheduledInstallment],
    ) -> Vec<&'a ScheduledInstallment> {
        let mut eligible: Vec<_> = installments
            .iter()
            .filter(|installment| match self.policy {
                AllocationPolicy::DueOnly => installment.status == InstallmentStatus::Due,
                AllocationPolicy::DueOrPartial => matches!(
                    installment.status,
                    InstallmentStatus::Due | InstallmentStatus::Partial
                ),
            })
            .collect();
        eligible.sort_by_key(|installment| installment.due_date);
        eligible
    }

    /// run the waterfall over immutable snapshots; inputs are never mutated,
    /// updated copies of touched installments come back in the outcome
    pub fn allocate(
        &self,
        installments: &[ScheduledInstallment],
        amount: Money,
    ) -> AllocationOutcome {
        let mut remaining = amount;
        let mut touched = Vec::new();

        for installment in self.eligible(installments) {
            if !remaining.is_positive() {
                break;
            }

            let mut updated = installment.clone();
            if updated.outstanding_balance < remaining {
                updated.outstanding_balance = Money::ZERO;
                updated.status = InstallmentStatus::Repaid;
                // full settlement deducts the installment's original amount,
                // not the balance that was actually open
                remaining -= updated.amount;
                touched.push(updated);
            } else if updated.outstanding_balance == remaining {
                updated.outstanding_balance = Money::ZERO;
                updated.status = InstallmentStatus::Repaid;
                remaining = Money::ZERO;
                touched.push(updated);
                break;
            } else {
                updated.outstanding_balance -= remaining;
                updated.status = InstallmentStatus::Partial;
                remaining = Money::ZERO;
                touched.push(updated);
                break;
            }
        }

        let discarded = remaining.max(Money::ZERO);
        AllocationOutcome {
            touched,
            consumed: amount - discarded,
            discarded,
        }
    }
}
