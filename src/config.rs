use serde::{Deserialize, Serialize};

use crate::types::{AllocationPolicy, RoundingPolicy};

/// engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// rule used by the schedule generator to split a principal
    pub rounding_policy: RoundingPolicy,
    /// rule used by the repayment allocator to pick eligible installments
    pub allocation_policy: AllocationPolicy,
}

impl EngineConfig {
    /// canonical servicing behavior: floor split with the remainder absorbed
    /// by the last installment, and only strictly-due installments eligible
    /// for allocation
    pub fn standard() -> Self {
        Self {
            rounding_policy: RoundingPolicy::RemainderLast,
            allocation_policy: AllocationPolicy::DueOnly,
        }
    }

    /// variant that lets partially settled installments keep absorbing
    /// payments instead of being skipped
    pub fn due_or_partial() -> Self {
        Self {
            allocation_policy: AllocationPolicy::DueOrPartial,
            ..Self::standard()
        }
    }

    /// variant that rounds installment amounts up and trims the tail
    pub fn ceiling_rounding() -> Self {
        Self {
            rounding_policy: RoundingPolicy::CeilingReduceLast,
            ..Self::standard()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::standard()
    }
}
