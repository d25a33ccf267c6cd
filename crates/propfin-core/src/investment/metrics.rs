use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::mortgage::monthly::{monthly_equivalent, monthly_equivalent_payment};
use crate::mortgage::schedule::build_schedule;
use crate::mortgage::source::ScheduleRegistry;
use crate::types::{
    with_metadata, AmortizationSchedule, ComputationOutput, Money, MortgageTerms,
    OperatingExpenses, Percent, PropertyFinancials, Rate,
};
use crate::PropFinResult;

/// Marginal tax rate assumed when the owner has not supplied one.
const DEFAULT_MARGINAL_TAX_RATE: Decimal = dec!(0.40);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which step of the fallback chain produced the monthly payment figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentBasis {
    /// Lender-stated periodic payment, converted to monthly equivalent.
    Stated,
    /// Next upcoming payment of the resolved schedule.
    Schedule,
    /// Level-payment annuity formula, no schedule available.
    Annuity,
    /// No mortgage on the property.
    Unfinanced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentMetricsInput {
    pub financials: PropertyFinancials,
    /// Schedule positioning date; callers bind "today" at the boundary.
    pub as_of: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marginal_tax_rate: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentMetricsOutput {
    /// Net operating income after vacancy, before debt service.
    pub noi: Money,
    /// NOI / current market value, ×100.
    pub cap_rate: Percent,
    pub annual_operating_expenses: Money,
    pub monthly_mortgage_payment: Money,
    pub payment_basis: PaymentBasis,
    pub annual_debt_service: Money,
    pub monthly_cash_flow: Money,
    pub annual_cash_flow: Money,
    /// Annual cash flow / total cash invested, ×100.
    pub cash_on_cash: Percent,
    /// NOI / annual debt service; zero when unfinanced.
    pub dscr: Decimal,
    /// Interest over the next twelve scheduled payments.
    pub annual_mortgage_interest: Money,
    pub annual_tax_savings: Money,
    pub after_tax_cash_flow: Money,
}

// ---------------------------------------------------------------------------
// Point metrics
// ---------------------------------------------------------------------------

/// Annualized operating expenses. Debt service is explicitly excluded.
pub fn annual_operating_expenses(expenses: &OperatingExpenses) -> Money {
    expenses.monthly_total() * dec!(12)
}

fn effective_vacancy(financials: &PropertyFinancials) -> Rate {
    financials
        .vacancy_rate
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
        .min(Decimal::ONE)
}

/// Net operating income: rent after vacancy loss, less operating expenses.
pub fn noi(financials: &PropertyFinancials) -> Money {
    let occupancy = Decimal::ONE - effective_vacancy(financials);
    financials.annual_rent * occupancy - annual_operating_expenses(&financials.monthly_expenses)
}

/// Capitalization rate, ×100. Zero when the market value is unknown or
/// non-positive; missing data renders as zero, never as an error.
pub fn cap_rate(financials: &PropertyFinancials) -> Percent {
    if financials.current_market_value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    noi(financials) / financials.current_market_value * dec!(100)
}

/// Annual cash flow over cash invested, ×100. Zero when the invested
/// amount is non-positive.
pub fn cash_on_cash(annual_cash_flow: Money, total_investment: Money) -> Percent {
    if total_investment <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    annual_cash_flow / total_investment * dec!(100)
}

/// Debt service coverage ratio. Zero when there is no debt service.
pub fn dscr(noi: Money, annual_debt_service: Money) -> Decimal {
    if annual_debt_service <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    noi / annual_debt_service
}

/// Interest deduction value at the marginal rate (default 40%).
pub fn annual_tax_savings(annual_mortgage_interest: Money, marginal_rate: Option<Rate>) -> Money {
    annual_mortgage_interest * marginal_rate.unwrap_or(DEFAULT_MARGINAL_TAX_RATE)
}

// ---------------------------------------------------------------------------
// Schedule-derived figures
// ---------------------------------------------------------------------------

/// Monthly-equivalent mortgage payment via an ordered fallback chain:
/// lender-stated payment first, then the schedule's next upcoming payment,
/// then the annuity formula. Each step's condition is explicit so the
/// degradation policy stays visible and testable.
pub fn monthly_mortgage_payment(
    mortgage: Option<&MortgageTerms>,
    schedule: Option<&AmortizationSchedule>,
    as_of: NaiveDate,
) -> PropFinResult<(Money, PaymentBasis)> {
    let Some(terms) = mortgage else {
        return Ok((Decimal::ZERO, PaymentBasis::Unfinanced));
    };

    if let Some(stated) = terms.payment_amount {
        if stated > Decimal::ZERO {
            return Ok((
                monthly_equivalent(stated, terms.payment_frequency),
                PaymentBasis::Stated,
            ));
        }
    }

    if let Some(schedule) = schedule {
        if let Some(next) = schedule.next_payment(as_of) {
            return Ok((
                monthly_equivalent(next.total_payment, terms.payment_frequency),
                PaymentBasis::Schedule,
            ));
        }
    }

    Ok((monthly_equivalent_payment(terms)?, PaymentBasis::Annuity))
}

/// Sum of interest across the next twelve scheduled payments from `as_of`:
/// the first twelve when none have occurred, the last twelve when fewer
/// than twelve remain. A rolling-window figure, not a calendar-year sum.
pub fn annual_mortgage_interest(
    schedule: Option<&AmortizationSchedule>,
    as_of: NaiveDate,
) -> Money {
    let Some(schedule) = schedule else {
        return Decimal::ZERO;
    };

    let len = schedule.payments.len();
    if len == 0 {
        return Decimal::ZERO;
    }

    let window = match schedule.next_payment_index(as_of) {
        Some(i) if i + 12 <= len => i..i + 12,
        _ if len >= 12 => len - 12..len,
        _ => 0..len,
    };

    schedule.payments[window]
        .iter()
        .map(|p| p.interest_portion)
        .sum()
}

// ---------------------------------------------------------------------------
// Full analysis
// ---------------------------------------------------------------------------

/// Derive the complete investment metric set for a property.
///
/// Missing or partial financial data degrades the affected metric to zero;
/// only genuinely invalid mortgage terms produce an error.
pub fn analyze_investment(
    input: &InvestmentMetricsInput,
    registry: Option<&ScheduleRegistry>,
) -> PropFinResult<ComputationOutput<InvestmentMetricsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let financials = &input.financials;

    if let Some(v) = financials.vacancy_rate {
        if v < Decimal::ZERO || v > Decimal::ONE {
            warnings.push(format!("Vacancy rate {v} clamped to [0, 1]"));
        }
    }

    let schedule = match &financials.mortgage {
        Some(terms) => Some(match registry {
            Some(r) => r.resolve(terms, input.as_of)?,
            None => build_schedule(terms, input.as_of)?,
        }),
        None => None,
    };

    let noi_value = noi(financials);
    let cap_rate_value = cap_rate(financials);
    if financials.current_market_value <= Decimal::ZERO {
        warnings.push("Current market value missing or non-positive; cap rate reported as zero".into());
    }

    let (monthly_payment, payment_basis) = monthly_mortgage_payment(
        financials.mortgage.as_ref(),
        schedule.as_ref(),
        input.as_of,
    )?;
    let annual_debt_service = monthly_payment * dec!(12);

    let monthly_rent = financials.annual_rent / dec!(12);
    let monthly_cash_flow =
        monthly_rent - financials.monthly_expenses.monthly_total() - monthly_payment;
    let annual_cash_flow = monthly_cash_flow * dec!(12);

    let cash_on_cash_value = cash_on_cash(annual_cash_flow, financials.total_investment);
    if financials.total_investment <= Decimal::ZERO {
        warnings.push("Total investment missing or non-positive; cash-on-cash reported as zero".into());
    }

    let annual_interest = annual_mortgage_interest(schedule.as_ref(), input.as_of);
    let tax_savings = annual_tax_savings(annual_interest, input.marginal_tax_rate);

    let output = InvestmentMetricsOutput {
        noi: noi_value,
        cap_rate: cap_rate_value,
        annual_operating_expenses: annual_operating_expenses(&financials.monthly_expenses),
        monthly_mortgage_payment: monthly_payment,
        payment_basis,
        annual_debt_service,
        monthly_cash_flow,
        annual_cash_flow,
        cash_on_cash: cash_on_cash_value,
        dscr: dscr(noi_value, annual_debt_service),
        annual_mortgage_interest: annual_interest,
        annual_tax_savings: tax_savings,
        after_tax_cash_flow: annual_cash_flow + tax_savings,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Rental Property Investment Metrics",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mortgage::frequency::PaymentFrequency;
    use crate::types::RateType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expenses(monthly_total: Decimal) -> OperatingExpenses {
        OperatingExpenses {
            property_tax: monthly_total,
            ..Default::default()
        }
    }

    fn financials() -> PropertyFinancials {
        PropertyFinancials {
            annual_rent: dec!(60000),
            monthly_expenses: expenses(dec!(1500)),
            vacancy_rate: Some(dec!(0.05)),
            current_market_value: dec!(1200000),
            total_investment: dec!(260000),
            mortgage: None,
        }
    }

    fn mortgage() -> MortgageTerms {
        MortgageTerms {
            original_amount: dec!(600000),
            interest_rate: dec!(0.0489),
            rate_type: RateType::Fixed,
            amortization_years: 25,
            payment_frequency: PaymentFrequency::Monthly,
            start_date: date(2023, 1, 1),
            current_balance: None,
            term_months: None,
            payment_amount: None,
            lender_reference: None,
        }
    }

    #[test]
    fn test_noi_with_vacancy() {
        // 60000 × 0.95 - 18000 = 39000
        assert_eq!(noi(&financials()), dec!(39000));
    }

    #[test]
    fn test_cap_rate_known_answer() {
        // 39000 / 1200000 × 100 = 3.25
        assert_eq!(cap_rate(&financials()), dec!(3.25));
    }

    #[test]
    fn test_cap_rate_zero_market_value() {
        let mut f = financials();
        f.current_market_value = Decimal::ZERO;
        assert_eq!(cap_rate(&f), Decimal::ZERO);
    }

    #[test]
    fn test_vacancy_clamped() {
        let mut f = financials();
        f.vacancy_rate = Some(dec!(1.8));
        // fully vacant, not negatively occupied
        assert_eq!(noi(&f), dec!(-18000));
    }

    #[test]
    fn test_missing_vacancy_treated_as_zero() {
        let mut f = financials();
        f.vacancy_rate = None;
        assert_eq!(noi(&f), dec!(42000));
    }

    #[test]
    fn test_dscr_zero_debt_service() {
        assert_eq!(dscr(dec!(39000), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_cash_on_cash_zero_investment() {
        assert_eq!(cash_on_cash(dec!(12000), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_payment_chain_prefers_stated_amount() {
        let mut m = mortgage();
        m.payment_amount = Some(dec!(3450.00));
        let (p, basis) = monthly_mortgage_payment(Some(&m), None, date(2024, 1, 1)).unwrap();
        assert_eq!(p, dec!(3450.00));
        assert_eq!(basis, PaymentBasis::Stated);
    }

    #[test]
    fn test_payment_chain_uses_schedule_next_payment() {
        let m = mortgage();
        let schedule = build_schedule(&m, m.start_date).unwrap();
        let (p, basis) =
            monthly_mortgage_payment(Some(&m), Some(&schedule), date(2024, 1, 1)).unwrap();
        assert_eq!(basis, PaymentBasis::Schedule);
        assert_eq!(p, schedule.payments[0].total_payment);
    }

    #[test]
    fn test_payment_chain_annuity_fallback() {
        let m = mortgage();
        let (p, basis) = monthly_mortgage_payment(Some(&m), None, date(2024, 1, 1)).unwrap();
        assert_eq!(basis, PaymentBasis::Annuity);
        assert!(p > dec!(3000) && p < dec!(4000), "payment {p}");
    }

    #[test]
    fn test_payment_chain_unfinanced() {
        let (p, basis) = monthly_mortgage_payment(None, None, date(2024, 1, 1)).unwrap();
        assert_eq!(p, Decimal::ZERO);
        assert_eq!(basis, PaymentBasis::Unfinanced);
    }

    #[test]
    fn test_annual_interest_window_from_today() {
        let m = mortgage();
        let schedule = build_schedule(&m, m.start_date).unwrap();
        // window starting at the first payment of 2024
        let from_2024 = annual_mortgage_interest(Some(&schedule), date(2024, 1, 1));
        let expected: Decimal = schedule
            .payments
            .iter()
            .filter(|p| p.payment_date >= date(2024, 1, 1))
            .take(12)
            .map(|p| p.interest_portion)
            .sum();
        assert_eq!(from_2024, expected);
    }

    #[test]
    fn test_annual_interest_last_twelve_near_maturity() {
        let m = mortgage();
        let schedule = build_schedule(&m, m.start_date).unwrap();
        let past_maturity = annual_mortgage_interest(Some(&schedule), date(2060, 1, 1));
        let expected: Decimal = schedule.payments[schedule.payments.len() - 12..]
            .iter()
            .map(|p| p.interest_portion)
            .sum();
        assert_eq!(past_maturity, expected);
    }

    #[test]
    fn test_tax_savings_default_rate() {
        assert_eq!(annual_tax_savings(dec!(10000), None), dec!(4000));
        assert_eq!(annual_tax_savings(dec!(10000), Some(dec!(0.33))), dec!(3300));
    }

    #[test]
    fn test_analyze_unfinanced_property() {
        let input = InvestmentMetricsInput {
            financials: financials(),
            as_of: date(2024, 6, 1),
            marginal_tax_rate: None,
        };
        let out = analyze_investment(&input, None).unwrap();
        let m = &out.result;

        assert_eq!(m.noi, dec!(39000));
        assert_eq!(m.cap_rate, dec!(3.25));
        assert_eq!(m.annual_debt_service, Decimal::ZERO);
        assert_eq!(m.dscr, Decimal::ZERO);
        assert_eq!(m.payment_basis, PaymentBasis::Unfinanced);
        // monthly CF = 5000 - 1500 = 3500
        assert_eq!(m.monthly_cash_flow, dec!(3500));
        assert_eq!(m.annual_cash_flow, dec!(42000));
    }

    #[test]
    fn test_analyze_financed_property() {
        let mut f = financials();
        f.mortgage = Some(mortgage());
        let input = InvestmentMetricsInput {
            financials: f,
            as_of: date(2024, 6, 1),
            marginal_tax_rate: None,
        };
        let out = analyze_investment(&input, None).unwrap();
        let m = &out.result;

        assert_eq!(m.payment_basis, PaymentBasis::Schedule);
        assert!(m.annual_debt_service > Decimal::ZERO);
        assert!(m.dscr > Decimal::ZERO);
        assert!(m.annual_mortgage_interest > Decimal::ZERO);
        assert_eq!(m.annual_tax_savings, m.annual_mortgage_interest * dec!(0.40));
        assert_eq!(m.after_tax_cash_flow, m.annual_cash_flow + m.annual_tax_savings);
    }

    #[test]
    fn test_degraded_inputs_warn_not_error() {
        let mut f = financials();
        f.current_market_value = Decimal::ZERO;
        f.total_investment = Decimal::ZERO;
        let input = InvestmentMetricsInput {
            financials: f,
            as_of: date(2024, 6, 1),
            marginal_tax_rate: None,
        };
        let out = analyze_investment(&input, None).unwrap();
        assert_eq!(out.result.cap_rate, Decimal::ZERO);
        assert_eq!(out.result.cash_on_cash, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 2);
    }
}
