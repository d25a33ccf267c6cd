use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::PropFinError;
use crate::mortgage::frequency::PaymentFrequency;
use crate::types::{AmortizationSchedule, Money, MortgageTerms, PaymentRecord, Rate};
use crate::PropFinResult;

/// Balances below this are treated as paid off; the final payment absorbs
/// the residue.
const BALANCE_EPSILON: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Payment amount
// ---------------------------------------------------------------------------

/// Standard level-payment annuity: P * r / (1 - (1+r)^-n).
/// Straight-line when the rate is zero.
pub fn level_payment(
    principal: Money,
    periodic_rate: Rate,
    total_payments: u32,
) -> PropFinResult<Money> {
    if total_payments == 0 {
        return Err(PropFinError::InvalidInput {
            field: "total_payments".into(),
            reason: "Number of payments must be > 0".into(),
        });
    }

    if periodic_rate.is_zero() {
        return Ok(principal / Decimal::from(total_payments));
    }

    let compound = (Decimal::ONE + periodic_rate).powd(Decimal::from(total_payments));
    let denominator = Decimal::ONE - Decimal::ONE / compound;

    if denominator.is_zero() {
        return Err(PropFinError::DivisionByZero {
            context: "level payment annuity factor".into(),
        });
    }

    Ok(principal * periodic_rate / denominator)
}

/// Contractual periodic payment for a mortgage, fixed by the lender at
/// origination from the original principal and full amortization.
///
/// Accelerated products do not price their own annuity: the payment is
/// half (quarter) of the plain monthly payment, paid 26 (52) times a year,
/// so their schedules retire the loan ahead of the nominal amortization.
pub fn periodic_payment(terms: &MortgageTerms) -> PropFinResult<Money> {
    let monthly = || {
        level_payment(
            terms.original_amount,
            PaymentFrequency::Monthly.periodic_rate(terms.interest_rate),
            PaymentFrequency::Monthly.total_payments(terms.amortization_years),
        )
    };

    match terms.payment_frequency {
        PaymentFrequency::AcceleratedBiWeekly => Ok(monthly()? / Decimal::TWO),
        PaymentFrequency::AcceleratedWeekly => Ok(monthly()? / dec!(4)),
        freq => level_payment(
            terms.original_amount,
            freq.periodic_rate(terms.interest_rate),
            freq.total_payments(terms.amortization_years),
        ),
    }
}

// ---------------------------------------------------------------------------
// Payment dates
// ---------------------------------------------------------------------------

/// Calendar-accurate date of payment `number` (1-based) after `start`.
///
/// Monthly payments keep the start's day-of-month, clamped to the last
/// valid day of shorter months (day 31 in a 30-day month becomes day 30).
/// Semi-monthly alternates the 1st and 15th; the first payment lands on the
/// next 1st-or-15th after the start date. Weekly cadences are exact-day
/// arithmetic, not month approximations.
pub fn payment_date(
    start: NaiveDate,
    frequency: PaymentFrequency,
    number: u32,
) -> PropFinResult<NaiveDate> {
    let date_error = || PropFinError::DateError(format!("payment {number} from {start}"));

    match frequency {
        PaymentFrequency::Monthly => start
            .checked_add_months(Months::new(number))
            .ok_or_else(date_error),
        PaymentFrequency::SemiMonthly => {
            let (months_ahead, day) = if start.day() < 15 {
                // first payment: 15th of the start month
                if number % 2 == 1 {
                    (number / 2, 15)
                } else {
                    (number / 2, 1)
                }
            } else {
                // first payment: 1st of the following month
                if number % 2 == 1 {
                    (number.div_ceil(2), 1)
                } else {
                    (number / 2, 15)
                }
            };
            start
                .checked_add_months(Months::new(months_ahead))
                .and_then(|d| d.with_day(day))
                .ok_or_else(date_error)
        }
        PaymentFrequency::BiWeekly | PaymentFrequency::AcceleratedBiWeekly => start
            .checked_add_days(Days::new(14 * number as u64))
            .ok_or_else(date_error),
        PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => start
            .checked_add_days(Days::new(7 * number as u64))
            .ok_or_else(date_error),
    }
}

// ---------------------------------------------------------------------------
// Schedule generation
// ---------------------------------------------------------------------------

fn validate_terms(terms: &MortgageTerms) -> PropFinResult<()> {
    if terms.original_amount <= Decimal::ZERO {
        return Err(PropFinError::InvalidInput {
            field: "original_amount".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if terms.interest_rate < Decimal::ZERO {
        return Err(PropFinError::InvalidInput {
            field: "interest_rate".into(),
            reason: "Rate cannot be negative".into(),
        });
    }
    if terms.amortization_years == 0 {
        return Err(PropFinError::InvalidInput {
            field: "amortization_years".into(),
            reason: "Amortization must be at least one year".into(),
        });
    }
    Ok(())
}

/// Number of payments needed to retire `balance` at the fixed `payment`:
/// `ceil(-ln(1 - B*r/P) / ln(1+r))`. Fails when the payment does not cover
/// interest on the balance.
fn payments_remaining(balance: Money, payment: Money, periodic_rate: Rate) -> PropFinResult<u32> {
    if periodic_rate.is_zero() {
        let n = (balance / payment).ceil();
        return n.to_u32().ok_or_else(|| PropFinError::InvalidInput {
            field: "current_balance".into(),
            reason: format!("Implied payment count {n} is out of range"),
        });
    }

    let interest_due = balance * periodic_rate;
    if payment <= interest_due {
        return Err(PropFinError::NonAmortizingPayment {
            payment,
            interest_due,
        });
    }

    let inner = Decimal::ONE - interest_due / payment;
    let n = (-inner.ln() / (Decimal::ONE + periodic_rate).ln()).ceil();
    n.to_u32().ok_or_else(|| PropFinError::InvalidInput {
        field: "current_balance".into(),
        reason: format!("Implied payment count {n} is out of range"),
    })
}

/// Opening balance and first payment number for the run.
///
/// With no authoritative balance the schedule starts at payment 1 from the
/// original principal. With one, the payment amount stays as fixed at
/// origination and the run resumes mid-schedule: estimate the position from
/// the remaining-payment count, then walk forward so no emitted payment
/// predates `as_of`.
fn starting_point(
    terms: &MortgageTerms,
    payment: Money,
    periodic_rate: Rate,
    as_of: NaiveDate,
) -> PropFinResult<(Money, u32)> {
    let balance = match terms.current_balance {
        Some(b) if b > Decimal::ZERO => b,
        _ => return Ok((terms.original_amount, 1)),
    };

    if balance >= terms.original_amount {
        // authoritative but not behind the origination point; no position
        // to estimate
        return Ok((balance, 1));
    }

    let remaining = payments_remaining(balance, payment, periodic_rate)?;
    let total = terms
        .payment_frequency
        .total_payments(terms.amortization_years);
    let mut number = total.saturating_sub(remaining) + 1;

    while payment_date(terms.start_date, terms.payment_frequency, number)? < as_of {
        number += 1;
    }

    Ok((balance, number))
}

/// Build the full payment-by-payment amortization schedule for `terms`.
///
/// The payment amount always comes from the original principal and full
/// amortization; a `current_balance` override only moves the starting point.
pub fn build_schedule(
    terms: &MortgageTerms,
    as_of: NaiveDate,
) -> PropFinResult<AmortizationSchedule> {
    validate_terms(terms)?;

    let periodic_rate = terms
        .payment_frequency
        .periodic_rate(terms.interest_rate);
    let payment = periodic_payment(terms)?;

    let (mut balance, mut number) = starting_point(terms, payment, periodic_rate, as_of)?;

    if !periodic_rate.is_zero() {
        let interest_due = balance * periodic_rate;
        if payment <= interest_due {
            return Err(PropFinError::NonAmortizingPayment {
                payment,
                interest_due,
            });
        }
    }

    let mut payments: Vec<PaymentRecord> = Vec::new();
    let mut total_interest = Decimal::ZERO;

    while balance > BALANCE_EPSILON {
        let interest = balance * periodic_rate;
        let mut principal = payment - interest;
        if principal > balance {
            principal = balance;
        }

        balance -= principal;
        if balance <= BALANCE_EPSILON && !balance.is_zero() {
            // absorb the rounding residue into the last payment
            principal += balance;
            balance = Decimal::ZERO;
        }

        let date = payment_date(terms.start_date, terms.payment_frequency, number)?;
        total_interest += interest;

        payments.push(PaymentRecord {
            payment_number: number,
            payment_date: date,
            total_payment: principal + interest,
            principal_portion: principal,
            interest_portion: interest,
            remaining_balance: balance,
        });

        number += 1;
    }

    let total_payment_count = payments.len() as u32;
    let final_payment_date = payments
        .last()
        .map(|p| p.payment_date)
        .unwrap_or(terms.start_date);

    Ok(AmortizationSchedule {
        payments,
        total_interest,
        total_payment_count,
        final_payment_date,
    })
}
