use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{with_metadata, ComputationOutput, Money};
use crate::PropFinResult;

/// Purchases closing on or after this date use the rebased 2026 brackets.
fn schedule_cutover() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, 1).expect("static cutover date")
}

// ---------------------------------------------------------------------------
// Bracket tables
// ---------------------------------------------------------------------------

/// One graduated tax bracket: the marginal `rate` applies to the slice of
/// price above `threshold`, up to the next bracket's threshold.
struct Bracket {
    threshold: Decimal,
    rate: Decimal,
}

/// Ontario provincial LTT, in force through March 2026.
const PROVINCIAL_2024: &[Bracket] = &[
    Bracket { threshold: dec!(0), rate: dec!(0.005) },
    Bracket { threshold: dec!(55000), rate: dec!(0.01) },
    Bracket { threshold: dec!(250000), rate: dec!(0.015) },
    Bracket { threshold: dec!(400000), rate: dec!(0.02) },
    Bracket { threshold: dec!(2000000), rate: dec!(0.025) },
];

/// Toronto municipal LTT mirrors the provincial brackets and adds the
/// 2024 luxury tiers above $3M.
const TORONTO_2024: &[Bracket] = &[
    Bracket { threshold: dec!(0), rate: dec!(0.005) },
    Bracket { threshold: dec!(55000), rate: dec!(0.01) },
    Bracket { threshold: dec!(250000), rate: dec!(0.015) },
    Bracket { threshold: dec!(400000), rate: dec!(0.02) },
    Bracket { threshold: dec!(2000000), rate: dec!(0.025) },
    Bracket { threshold: dec!(3000000), rate: dec!(0.035) },
    Bracket { threshold: dec!(4000000), rate: dec!(0.045) },
    Bracket { threshold: dec!(5000000), rate: dec!(0.055) },
    Bracket { threshold: dec!(10000000), rate: dec!(0.065) },
    Bracket { threshold: dec!(20000000), rate: dec!(0.075) },
];

/// April 2026 rebasing: thresholds indexed up, new 3% provincial tier
/// above $3M.
const PROVINCIAL_2026: &[Bracket] = &[
    Bracket { threshold: dec!(0), rate: dec!(0.005) },
    Bracket { threshold: dec!(75000), rate: dec!(0.01) },
    Bracket { threshold: dec!(300000), rate: dec!(0.015) },
    Bracket { threshold: dec!(500000), rate: dec!(0.02) },
    Bracket { threshold: dec!(2000000), rate: dec!(0.025) },
    Bracket { threshold: dec!(3000000), rate: dec!(0.03) },
];

const TORONTO_2026: &[Bracket] = &[
    Bracket { threshold: dec!(0), rate: dec!(0.005) },
    Bracket { threshold: dec!(75000), rate: dec!(0.01) },
    Bracket { threshold: dec!(300000), rate: dec!(0.015) },
    Bracket { threshold: dec!(500000), rate: dec!(0.02) },
    Bracket { threshold: dec!(2000000), rate: dec!(0.025) },
    Bracket { threshold: dec!(3000000), rate: dec!(0.035) },
    Bracket { threshold: dec!(4000000), rate: dec!(0.045) },
    Bracket { threshold: dec!(5000000), rate: dec!(0.055) },
    Bracket { threshold: dec!(10000000), rate: dec!(0.065) },
    Bracket { threshold: dec!(20000000), rate: dec!(0.075) },
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LttInput {
    pub price: Money,
    pub city: String,
    #[serde(default = "default_province")]
    pub province: String,
    /// Closing date selects the bracket schedule; None assumes the current
    /// schedule and warns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_date: Option<NaiveDate>,
    /// A non-negative override (e.g. from a statement of adjustments)
    /// short-circuits all computation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_override: Option<Money>,
}

fn default_province() -> String {
    "ON".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LttOutput {
    pub total: Money,
    pub provincial: Money,
    pub municipal: Money,
    pub schedule_used: String,
    pub override_applied: bool,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Walk brackets in ascending threshold order, taxing each slice of the
/// price at its marginal rate. The top bracket is unbounded.
fn graduated_tax(price: Money, brackets: &[Bracket]) -> Money {
    let mut tax = Decimal::ZERO;

    for (i, bracket) in brackets.iter().enumerate() {
        if price <= bracket.threshold {
            break;
        }
        let upper = brackets
            .get(i + 1)
            .map(|b| b.threshold)
            .unwrap_or(Decimal::MAX);
        let slice = price.min(upper) - bracket.threshold;
        tax += slice * bracket.rate;
    }

    tax
}

fn schedule_for(closing_date: Option<NaiveDate>) -> (&'static str, &'static [Bracket], &'static [Bracket]) {
    match closing_date {
        Some(d) if d >= schedule_cutover() => ("2026", PROVINCIAL_2026, TORONTO_2026),
        _ => ("2024", PROVINCIAL_2024, TORONTO_2024),
    }
}

/// Tiered provincial plus (for Toronto) municipal land transfer tax.
///
/// Ontario-only by design: other provinces report zero rather than guess
/// at schedules the application does not carry.
pub fn calculate_ltt(input: &LttInput) -> PropFinResult<ComputationOutput<LttOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if let Some(override_amount) = input.manual_override {
        if override_amount >= Decimal::ZERO {
            let elapsed = start.elapsed().as_micros() as u64;
            return Ok(with_metadata(
                "Land Transfer Tax (manual override)",
                input,
                warnings,
                elapsed,
                LttOutput {
                    total: override_amount,
                    provincial: Decimal::ZERO,
                    municipal: Decimal::ZERO,
                    schedule_used: "override".into(),
                    override_applied: true,
                },
            ));
        }
    }

    if !input.province.eq_ignore_ascii_case("ON") {
        let elapsed = start.elapsed().as_micros() as u64;
        return Ok(with_metadata(
            "Land Transfer Tax (Ontario graduated brackets)",
            input,
            warnings,
            elapsed,
            LttOutput {
                total: Decimal::ZERO,
                provincial: Decimal::ZERO,
                municipal: Decimal::ZERO,
                schedule_used: "none".into(),
                override_applied: false,
            },
        ));
    }

    if input.closing_date.is_none() {
        warnings.push(
            "No closing date supplied; assumed the current rate schedule, which may be stale"
                .into(),
        );
    }

    let (schedule_used, provincial_brackets, toronto_brackets) =
        schedule_for(input.closing_date);

    let provincial = graduated_tax(input.price, provincial_brackets);
    let municipal = if input.city.to_lowercase().contains("toronto") {
        graduated_tax(input.price, toronto_brackets)
    } else {
        Decimal::ZERO
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Land Transfer Tax (Ontario graduated brackets)",
        input,
        warnings,
        elapsed,
        LttOutput {
            total: provincial + municipal,
            provincial,
            municipal,
            schedule_used: schedule_used.into(),
            override_applied: false,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(price: Decimal, city: &str, closing: Option<NaiveDate>) -> LttInput {
        LttInput {
            price,
            city: city.into(),
            province: "ON".into(),
            closing_date: closing,
            manual_override: None,
        }
    }

    #[test]
    fn test_provincial_known_answer() {
        // $1.2M on the 2024 schedule:
        // 55k×0.5% + 195k×1% + 150k×1.5% + 800k×2% = 275 + 1950 + 2250 + 16000
        let out = calculate_ltt(&input(dec!(1200000), "Ottawa", Some(date(2025, 1, 1)))).unwrap();
        assert_eq!(out.result.provincial, dec!(20475));
        assert_eq!(out.result.municipal, Decimal::ZERO);
        assert_eq!(out.result.total, dec!(20475));
        assert_eq!(out.result.schedule_used, "2024");
    }

    #[test]
    fn test_toronto_doubles_up() {
        let toronto =
            calculate_ltt(&input(dec!(1200000), "Toronto", Some(date(2025, 1, 1)))).unwrap();
        assert_eq!(toronto.result.municipal, dec!(20475));
        assert_eq!(toronto.result.total, dec!(40950));
    }

    #[test]
    fn test_toronto_match_is_case_insensitive_substring() {
        let out =
            calculate_ltt(&input(dec!(500000), "Old Toronto (East York)", Some(date(2025, 1, 1))))
                .unwrap();
        assert!(out.result.municipal > Decimal::ZERO);
    }

    #[test]
    fn test_municipal_monotonicity() {
        for price in [dec!(60000), dec!(400000), dec!(1200000), dec!(5000000)] {
            let toronto = calculate_ltt(&input(price, "Toronto", Some(date(2025, 1, 1)))).unwrap();
            let ottawa = calculate_ltt(&input(price, "Ottawa", Some(date(2025, 1, 1)))).unwrap();
            assert!(
                toronto.result.total >= ottawa.result.total,
                "price {price}: Toronto {} < Ottawa {}",
                toronto.result.total,
                ottawa.result.total
            );
        }
    }

    #[test]
    fn test_cutover_boundary() {
        let before =
            calculate_ltt(&input(dec!(1200000), "Toronto", Some(date(2026, 3, 31)))).unwrap();
        let after =
            calculate_ltt(&input(dec!(1200000), "Toronto", Some(date(2026, 4, 1)))).unwrap();

        assert_eq!(before.result.schedule_used, "2024");
        assert_eq!(after.result.schedule_used, "2026");
        assert_ne!(before.result.total, after.result.total);
    }

    #[test]
    fn test_2026_schedule_known_answer() {
        // $1.2M on the 2026 schedule:
        // 75k×0.5% + 225k×1% + 200k×1.5% + 700k×2% = 375 + 2250 + 3000 + 14000
        let out = calculate_ltt(&input(dec!(1200000), "Ottawa", Some(date(2026, 6, 1)))).unwrap();
        assert_eq!(out.result.provincial, dec!(19625));
    }

    #[test]
    fn test_luxury_tiers_above_cutoff() {
        // $3.5M Toronto 2024: municipal adds the 3.5% tier on the top 500k
        let out = calculate_ltt(&input(dec!(3500000), "Toronto", Some(date(2025, 1, 1)))).unwrap();
        // provincial: 275 + 1950 + 2250 + 32000 + 37500 = 73975
        assert_eq!(out.result.provincial, dec!(73975));
        // municipal: 275 + 1950 + 2250 + 32000 + 25000 + 17500 = 78975
        assert_eq!(out.result.municipal, dec!(78975));
    }

    #[test]
    fn test_missing_closing_date_warns_and_defaults() {
        let out = calculate_ltt(&input(dec!(800000), "Toronto", None)).unwrap();
        assert_eq!(out.result.schedule_used, "2024");
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_non_ontario_returns_zero() {
        let mut i = input(dec!(800000), "Vancouver", Some(date(2025, 1, 1)));
        i.province = "BC".into();
        let out = calculate_ltt(&i).unwrap();
        assert_eq!(out.result.total, Decimal::ZERO);
        assert_eq!(out.result.schedule_used, "none");
    }

    #[test]
    fn test_manual_override_short_circuits() {
        let mut i = input(dec!(800000), "Toronto", Some(date(2025, 1, 1)));
        i.manual_override = Some(dec!(12345.67));
        let out = calculate_ltt(&i).unwrap();
        assert_eq!(out.result.total, dec!(12345.67));
        assert!(out.result.override_applied);
    }

    #[test]
    fn test_negative_override_ignored() {
        let mut i = input(dec!(800000), "Ottawa", Some(date(2025, 1, 1)));
        i.manual_override = Some(dec!(-1));
        let out = calculate_ltt(&i).unwrap();
        assert!(!out.result.override_applied);
        assert!(out.result.total > Decimal::ZERO);
    }

    #[test]
    fn test_price_below_first_threshold() {
        let out = calculate_ltt(&input(dec!(40000), "Ottawa", Some(date(2025, 1, 1)))).unwrap();
        // whole price in the 0.5% bracket
        assert_eq!(out.result.total, dec!(200));
    }
}
