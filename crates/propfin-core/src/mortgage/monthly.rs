use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::mortgage::frequency::PaymentFrequency;
use crate::mortgage::schedule::level_payment;
use crate::types::{Money, MortgageTerms};
use crate::PropFinResult;

/// Scaling factor from a periodic figure to its monthly equivalent.
///
/// The factor is per-frequency, not per-component: payment, principal and
/// interest portions all scale identically. Semi-monthly figures pass
/// through unchanged, matching how the dashboard has always displayed them.
pub fn monthly_factor(frequency: PaymentFrequency) -> Decimal {
    match frequency {
        PaymentFrequency::Monthly | PaymentFrequency::SemiMonthly => Decimal::ONE,
        PaymentFrequency::BiWeekly | PaymentFrequency::AcceleratedBiWeekly => {
            dec!(26) / dec!(12)
        }
        PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => dec!(52) / dec!(12),
    }
}

/// Monthly equivalent of any schedule-derived periodic amount (payment,
/// principal portion, or interest portion).
pub fn monthly_equivalent(amount: Money, frequency: PaymentFrequency) -> Money {
    amount * monthly_factor(frequency)
}

/// Monthly-equivalent contractual payment for a mortgage.
///
/// Accelerated variants are defined off the plain monthly payment for the
/// same loan: half (quarter) of it, paid 26 (52) times a year, so the
/// monthly equivalent is that fraction scaled by 26/12 (52/12). That lands
/// above the monthly payment itself, which is where the faster payoff
/// comes from.
pub fn monthly_equivalent_payment(terms: &MortgageTerms) -> PropFinResult<Money> {
    let plain_monthly = || {
        level_payment(
            terms.original_amount,
            PaymentFrequency::Monthly.periodic_rate(terms.interest_rate),
            PaymentFrequency::Monthly.total_payments(terms.amortization_years),
        )
    };

    match terms.payment_frequency {
        PaymentFrequency::AcceleratedBiWeekly => {
            Ok(plain_monthly()? / Decimal::TWO * dec!(26) / dec!(12))
        }
        PaymentFrequency::AcceleratedWeekly => {
            Ok(plain_monthly()? / dec!(4) * dec!(52) / dec!(12))
        }
        freq => {
            let payment = level_payment(
                terms.original_amount,
                freq.periodic_rate(terms.interest_rate),
                freq.total_payments(terms.amortization_years),
            )?;
            Ok(monthly_equivalent(payment, freq))
        }
    }
}
