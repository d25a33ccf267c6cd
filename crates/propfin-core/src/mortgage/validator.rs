use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::AmortizationSchedule;

/// An externally supplied schedule may be off by small lender rounding,
/// but a final balance beyond this is a sign the history is incomplete or
/// mis-parsed.
const FINAL_BALANCE_TOLERANCE: Decimal = dec!(10);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub final_balance: Decimal,
}

/// Sanity-check an externally supplied schedule: it must be non-empty and
/// terminate at (near) zero balance. Failures are warnings, not hard
/// errors; the schedule stays usable and the caller decides whether to
/// surface the discrepancy.
pub fn validate(schedule: &AmortizationSchedule) -> ScheduleValidation {
    let Some(last) = schedule.payments.last() else {
        return ScheduleValidation {
            is_valid: false,
            warning: Some("Schedule contains no payments".into()),
            final_balance: Decimal::ZERO,
        };
    };

    let final_balance = last.remaining_balance;
    if final_balance.abs() > FINAL_BALANCE_TOLERANCE {
        return ScheduleValidation {
            is_valid: false,
            warning: Some(format!(
                "Schedule does not amortize to zero: final balance {final_balance}"
            )),
            final_balance,
        };
    }

    ScheduleValidation {
        is_valid: true,
        warning: None,
        final_balance,
    }
}
