//! 60/60 billing
//!
//! Every started minute is billed in full and any call with a non-zero
//! duration bills at least one minute. A 61 second call at 0.15/min costs
//! 0.30, never 0.1525. Nothing in this crate bills per second.

use rust_decimal::Decimal;

pub const BILLING_INCREMENT_SECONDS: u64 = 60;
pub const COST_DECIMAL_PLACES: u32 = 4;

pub struct CostCalculator;

impl CostCalculator {
    /// Whole minutes billed for one call.
    pub fn billed_minutes(duration_seconds: u64) -> u64 {
        duration_seconds.div_ceil(BILLING_INCREMENT_SECONDS)
    }

    pub fn calculate(duration_seconds: u64, cost_per_minute: Decimal) -> Decimal {
        if duration_seconds == 0 || cost_per_minute.is_zero() {
            return Decimal::ZERO;
        }
        let minutes = Decimal::from(Self::billed_minutes(duration_seconds));
        (minutes * cost_per_minute).round_dp(COST_DECIMAL_PLACES)
    }

    /// Minutes billed for a group of calls: at least one per call.
    pub fn billed_minutes_for_calls(call_count: u64, total_seconds: u64) -> u64 {
        call_count.max(Self::billed_minutes(total_seconds))
    }
}
