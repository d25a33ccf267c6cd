use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use propfin_core::mortgage::frequency::PaymentFrequency;
use propfin_core::mortgage::monthly::{monthly_equivalent, monthly_equivalent_payment};
use propfin_core::mortgage::schedule::{build_schedule, level_payment};
use propfin_core::mortgage::validator;
use propfin_core::types::{MortgageTerms, RateType};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Amortization schedule tests — termination, conservation, monotonicity,
// frequency arithmetic
// ===========================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn terms(
    principal: Decimal,
    rate: Decimal,
    years: u32,
    frequency: PaymentFrequency,
) -> MortgageTerms {
    MortgageTerms {
        original_amount: principal,
        interest_rate: rate,
        rate_type: RateType::Fixed,
        amortization_years: years,
        payment_frequency: frequency,
        start_date: date(2024, 1, 1),
        current_balance: None,
        term_months: None,
        payment_amount: None,
        lender_reference: None,
    }
}

// ---------------------------------------------------------------------------
// Termination and numbering
// ---------------------------------------------------------------------------

#[test]
fn test_schedule_terminates_with_dense_numbering() {
    for frequency in [
        PaymentFrequency::Monthly,
        PaymentFrequency::SemiMonthly,
        PaymentFrequency::BiWeekly,
        PaymentFrequency::Weekly,
    ] {
        let t = terms(dec!(350000), dec!(0.0519), 25, frequency);
        let s = build_schedule(&t, t.start_date).unwrap();

        assert!(!s.payments.is_empty(), "{frequency}: empty schedule");
        assert_eq!(
            s.payments.last().unwrap().remaining_balance,
            Decimal::ZERO,
            "{frequency}: non-zero final balance"
        );
        for (i, p) in s.payments.iter().enumerate() {
            assert_eq!(p.payment_number, (i + 1) as u32, "{frequency}: gap at {i}");
        }
        assert_eq!(s.total_payment_count, s.payments.len() as u32);
        assert_eq!(
            s.final_payment_date,
            s.payments.last().unwrap().payment_date
        );
    }
}

#[test]
fn test_full_term_payment_counts() {
    let t = terms(dec!(350000), dec!(0.0519), 25, PaymentFrequency::Monthly);
    let s = build_schedule(&t, t.start_date).unwrap();
    assert_eq!(s.total_payment_count, 300);

    let t = terms(dec!(350000), dec!(0.0519), 25, PaymentFrequency::Weekly);
    let s = build_schedule(&t, t.start_date).unwrap();
    assert_eq!(s.total_payment_count, 1300);
}

// ---------------------------------------------------------------------------
// Conservation
// ---------------------------------------------------------------------------

#[test]
fn test_principal_and_interest_conservation() {
    let t = terms(dec!(425000), dec!(0.0444), 30, PaymentFrequency::Monthly);
    let s = build_schedule(&t, t.start_date).unwrap();

    let principal_total: Decimal = s.payments.iter().map(|p| p.principal_portion).sum();
    assert!(
        (principal_total - dec!(425000)).abs() < dec!(0.01),
        "principal drifted: {principal_total}"
    );

    let interest_total: Decimal = s.payments.iter().map(|p| p.interest_portion).sum();
    assert_eq!(interest_total, s.total_interest);

    for p in &s.payments {
        assert_eq!(p.total_payment, p.principal_portion + p.interest_portion);
    }
}

// ---------------------------------------------------------------------------
// Monotonicity
// ---------------------------------------------------------------------------

#[test]
fn test_balance_strictly_decreasing_until_zero() {
    let t = terms(dec!(250000), dec!(0.06), 20, PaymentFrequency::Monthly);
    let s = build_schedule(&t, t.start_date).unwrap();

    let mut previous = dec!(250000);
    for p in &s.payments {
        assert!(
            p.remaining_balance < previous,
            "balance not decreasing at payment {}",
            p.payment_number
        );
        previous = p.remaining_balance;
    }
    assert_eq!(previous, Decimal::ZERO);
}

// ---------------------------------------------------------------------------
// Zero-rate edge case
// ---------------------------------------------------------------------------

#[test]
fn test_zero_rate_constant_principal_payments() {
    let t = terms(dec!(120000), Decimal::ZERO, 10, PaymentFrequency::Monthly);
    let s = build_schedule(&t, t.start_date).unwrap();

    let expected_payment = dec!(120000) / dec!(120);
    assert_eq!(s.total_payment_count, 120);
    assert_eq!(s.total_interest, Decimal::ZERO);

    for p in &s.payments {
        assert_eq!(p.interest_portion, Decimal::ZERO);
        assert!(
            (p.principal_portion - expected_payment).abs() < dec!(0.01),
            "payment {} principal {}",
            p.payment_number,
            p.principal_portion
        );
    }
}

// ---------------------------------------------------------------------------
// Monthly-equivalent conversion
// ---------------------------------------------------------------------------

#[test]
fn test_monthly_conversion_is_identity_for_monthly() {
    let t = terms(dec!(300000), dec!(0.05), 25, PaymentFrequency::Monthly);
    let s = build_schedule(&t, t.start_date).unwrap();
    let p = &s.payments[0];

    assert_eq!(
        monthly_equivalent(p.total_payment, PaymentFrequency::Monthly),
        p.total_payment
    );
    assert_eq!(
        monthly_equivalent(p.principal_portion, PaymentFrequency::Monthly),
        p.principal_portion
    );
    assert_eq!(
        monthly_equivalent(p.interest_portion, PaymentFrequency::Monthly),
        p.interest_portion
    );
}

#[test]
fn test_accelerated_biweekly_equivalent_against_independent_monthly() {
    let principal = dec!(480000);
    let rate = dec!(0.0479);
    let years = 25;

    // independently computed plain monthly schedule for the same loan
    let monthly_terms = terms(principal, rate, years, PaymentFrequency::Monthly);
    let monthly_schedule = build_schedule(&monthly_terms, monthly_terms.start_date).unwrap();
    let monthly_payment = monthly_schedule.payments[0].total_payment;

    let accel_terms = terms(principal, rate, years, PaymentFrequency::AcceleratedBiWeekly);
    let equivalent = monthly_equivalent_payment(&accel_terms).unwrap();

    assert_eq!(equivalent, monthly_payment / dec!(2) * dec!(26) / dec!(12));
}

#[test]
fn test_plain_biweekly_equivalent_scales_by_26_over_12() {
    let t = terms(dec!(480000), dec!(0.0479), 25, PaymentFrequency::BiWeekly);
    let s = build_schedule(&t, t.start_date).unwrap();
    let p = s.payments[0].total_payment;
    assert_eq!(
        monthly_equivalent(p, PaymentFrequency::BiWeekly),
        p * dec!(26) / dec!(12)
    );
}

// ---------------------------------------------------------------------------
// Level payment sanity
// ---------------------------------------------------------------------------

#[test]
fn test_level_payment_against_known_quote() {
    // $500k at 5.19% over 25 years: Canadian lenders quote ~$2,966/month
    let r = PaymentFrequency::Monthly.periodic_rate(dec!(0.0519));
    let p = level_payment(dec!(500000), r, 300).unwrap();
    assert!(p > dec!(2900) && p < dec!(3050), "monthly payment {p}");
}

// ---------------------------------------------------------------------------
// Generated schedules satisfy the external-schedule validator
// ---------------------------------------------------------------------------

#[test]
fn test_generated_schedule_passes_validation() {
    let t = terms(dec!(350000), dec!(0.0519), 25, PaymentFrequency::BiWeekly);
    let s = build_schedule(&t, t.start_date).unwrap();
    let v = validator::validate(&s);
    assert!(v.is_valid);
    assert_eq!(v.final_balance, Decimal::ZERO);
}
