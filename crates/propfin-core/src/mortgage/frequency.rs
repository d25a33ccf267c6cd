use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::error::PropFinError;
use crate::types::Rate;

/// Canadian mortgage payment cadences.
///
/// The accelerated variants pay half (quarter) of the monthly payment every
/// two weeks (week): 26 (52) payments a year instead of 24 (48), which is
/// what shortens the amortization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentFrequency {
    Monthly,
    SemiMonthly,
    BiWeekly,
    AcceleratedBiWeekly,
    Weekly,
    AcceleratedWeekly,
}

impl PaymentFrequency {
    /// Number of payments in a calendar year.
    pub fn payments_per_year(&self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::SemiMonthly => 24,
            PaymentFrequency::BiWeekly | PaymentFrequency::AcceleratedBiWeekly => 26,
            PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => 52,
        }
    }

    /// Payments over the full amortization period.
    pub fn total_payments(&self, amortization_years: u32) -> u32 {
        amortization_years * self.payments_per_year()
    }

    /// Payment periods per semi-annual compounding interval.
    ///
    /// Semi-monthly shares the monthly value: lenders quote semi-monthly
    /// products off the monthly periodic rate.
    fn periods_per_half_year(&self) -> u32 {
        match self {
            PaymentFrequency::Monthly | PaymentFrequency::SemiMonthly => 6,
            PaymentFrequency::BiWeekly | PaymentFrequency::AcceleratedBiWeekly => 13,
            PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => 26,
        }
    }

    /// Periodic interest rate under the Canadian convention: fixed-rate
    /// mortgages compound semi-annually regardless of payment cadence, so
    /// the per-period rate is `(1 + annual/2)^(1/k) - 1`.
    pub fn periodic_rate(&self, annual_rate: Rate) -> Rate {
        if annual_rate.is_zero() {
            return Decimal::ZERO;
        }
        let semi_annual = annual_rate / Decimal::TWO;
        let k = Decimal::from(self.periods_per_half_year());
        (Decimal::ONE + semi_annual).powd(Decimal::ONE / k) - Decimal::ONE
    }
}

impl FromStr for PaymentFrequency {
    type Err = PropFinError;

    /// Case-insensitive; `_`, `-` and spaces are ignored. Anything else
    /// fails rather than silently defaulting to monthly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "monthly" => Ok(PaymentFrequency::Monthly),
            "semimonthly" => Ok(PaymentFrequency::SemiMonthly),
            "biweekly" => Ok(PaymentFrequency::BiWeekly),
            "acceleratedbiweekly" => Ok(PaymentFrequency::AcceleratedBiWeekly),
            "weekly" => Ok(PaymentFrequency::Weekly),
            "acceleratedweekly" => Ok(PaymentFrequency::AcceleratedWeekly),
            _ => Err(PropFinError::InvalidFrequency(s.to_string())),
        }
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentFrequency::Monthly => "Monthly",
            PaymentFrequency::SemiMonthly => "SemiMonthly",
            PaymentFrequency::BiWeekly => "BiWeekly",
            PaymentFrequency::AcceleratedBiWeekly => "AcceleratedBiWeekly",
            PaymentFrequency::Weekly => "Weekly",
            PaymentFrequency::AcceleratedWeekly => "AcceleratedWeekly",
        };
        write!(f, "{label}")
    }
}
