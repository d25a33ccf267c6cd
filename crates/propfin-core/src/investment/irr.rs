use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PropFinError;
use crate::investment::metrics;
use crate::mortgage::schedule::build_schedule;
use crate::mortgage::source::ScheduleRegistry;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, PropertyFinancials, Rate};
use crate::PropFinResult;

/// Reported IRR is bounded to this range; anything outside is clamped and
/// flagged rather than surfaced raw.
const IRR_FLOOR_PERCENT: Decimal = dec!(-99);
const IRR_CEILING_PERCENT: Decimal = dec!(500);

/// Annual appreciation assumed when no usable exit cap rate is supplied.
const FALLBACK_APPRECIATION: Decimal = dec!(1.03);

const DEFAULT_TOLERANCE: Decimal = dec!(0.000001);
const DEFAULT_MAX_ITERATIONS: u32 = 1000;

/// Iteration budget the dashboard call sites use.
pub const PRODUCTION_MAX_ITERATIONS: u32 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOptions {
    pub tolerance: Decimal,
    pub max_iterations: u32,
}

impl Default for IrrOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Solver result. `converged`/`clamped` let callers distinguish a clean
/// answer from one that needs a disclaimer; legacy call sites that only
/// want the number read `irr_percent` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOutcome {
    pub irr_percent: Percent,
    pub converged: bool,
    pub clamped: bool,
    pub iterations: u32,
}

/// How the terminal sale value was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalBasis {
    /// Final-year NOI capitalized at the supplied exit cap rate.
    ExitCap,
    /// Flat 3% annual appreciation on the current market value.
    Appreciation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrProjectionInput {
    pub financials: PropertyFinancials,
    /// Holding period in years.
    pub years: u32,
    /// Exit cap rate, ×100 (e.g. 5.5). Falls back to appreciation when
    /// absent or unusable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_cap_rate: Option<Percent>,
    #[serde(default = "default_selling_costs")]
    pub selling_costs_percent: Decimal,
    pub as_of: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
}

fn default_selling_costs() -> Decimal {
    dec!(5.0)
}

/// Yearly cash-flow vector plus the terminal-value decomposition behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedCashFlows {
    /// Index 0 is the initial investment (negative); the final entry
    /// includes net sale proceeds.
    pub flows: Vec<Money>,
    pub future_value: Money,
    pub future_balance: Money,
    pub net_sale_proceeds: Money,
    pub terminal_basis: TerminalBasis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrProjection {
    pub cash_flows: ProjectedCashFlows,
    pub outcome: IrrOutcome,
}

// ---------------------------------------------------------------------------
// NPV
// ---------------------------------------------------------------------------

/// Net present value of a yearly cash-flow vector at `rate`.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> PropFinResult<Money> {
    if rate <= dec!(-1) {
        return Err(PropFinError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(PropFinError::DivisionByZero {
                context: format!("NPV discount factor at year {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// NPV(r) and dNPV/dr, or None when the arithmetic leaves Decimal range.
fn npv_and_derivative(cash_flows: &[Money], rate: Decimal) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE.checked_add(rate)?;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE; // 1/(1+r)^t, t starting at 0

    for (t, cf) in cash_flows.iter().enumerate() {
        npv = npv.checked_add(cf.checked_mul(discount)?)?;
        if t > 0 {
            // d/dr of CF_t/(1+r)^t = -t * CF_t / (1+r)^(t+1)
            let term = Decimal::from(-(t as i64))
                .checked_mul(*cf)?
                .checked_mul(discount)?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_add(term)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((npv, dnpv))
}

// ---------------------------------------------------------------------------
// Newton-Raphson solver
// ---------------------------------------------------------------------------

/// Solve for the internal rate of return of a yearly cash-flow vector.
///
/// Near-zero derivatives nudge the rate up (×1.1) and out-of-range
/// arithmetic nudges it down (×0.9) instead of dividing by ~0. Pathological
/// vectors never error: the budget runs out and the clamped, non-converged
/// outcome says so.
pub fn solve_irr(cash_flows: &[Money], options: &IrrOptions) -> PropFinResult<IrrOutcome> {
    if cash_flows.len() < 2 {
        return Err(PropFinError::InvalidInput {
            field: "cash_flows".into(),
            reason: "IRR requires at least 2 cash flows".into(),
        });
    }
    if cash_flows[0] >= Decimal::ZERO {
        return Err(PropFinError::InvalidInput {
            field: "cash_flows".into(),
            reason: "Index 0 must be the initial investment as a negative outflow".into(),
        });
    }

    let mut rate = dec!(0.10);
    let mut converged = false;
    let mut iterations = 0;

    for i in 0..options.max_iterations {
        iterations = i + 1;

        let Some((npv_value, derivative)) = npv_and_derivative(cash_flows, rate) else {
            rate = rate.saturating_mul(dec!(0.9));
            continue;
        };

        if derivative.abs() < options.tolerance {
            rate = rate.saturating_mul(dec!(1.1));
            continue;
        }

        let Some(step) = npv_value.checked_div(derivative) else {
            rate = rate.saturating_mul(dec!(0.9));
            continue;
        };
        let Some(new_rate) = rate.checked_sub(step) else {
            rate = rate.saturating_mul(dec!(0.9));
            continue;
        };

        let delta = (new_rate - rate).abs();
        rate = new_rate;

        if delta < options.tolerance {
            converged = true;
            break;
        }

        // keep 1+r positive for the next evaluation
        if rate <= dec!(-0.99) {
            rate = dec!(-0.99);
        }
    }

    let raw_percent = rate.saturating_mul(dec!(100));
    let mut irr_percent = raw_percent;
    let mut clamped = false;

    if irr_percent > IRR_CEILING_PERCENT {
        irr_percent = IRR_CEILING_PERCENT;
        clamped = true;
    } else if irr_percent < IRR_FLOOR_PERCENT {
        irr_percent = IRR_FLOOR_PERCENT;
        clamped = true;
    }

    Ok(IrrOutcome {
        irr_percent,
        converged,
        clamped,
        iterations,
    })
}

// ---------------------------------------------------------------------------
// Cash-flow projection
// ---------------------------------------------------------------------------

/// Build the discrete yearly cash-flow vector for a holding period.
///
/// Annual cash flow is the current run-rate held flat; rent and expense
/// growth are a consumer concern. The exit mortgage balance is a linear
/// principal-reduction approximation, not a schedule walk; the error is
/// small against sale-price uncertainty at the same horizon.
pub fn build_cash_flows(
    input: &IrrProjectionInput,
    registry: Option<&ScheduleRegistry>,
) -> PropFinResult<ProjectedCashFlows> {
    if input.years == 0 {
        return Err(PropFinError::InvalidInput {
            field: "years".into(),
            reason: "Holding period must be at least 1 year".into(),
        });
    }

    let financials = &input.financials;
    if financials.total_investment <= Decimal::ZERO {
        return Err(PropFinError::InvalidInput {
            field: "total_investment".into(),
            reason: "Initial investment must be positive so index 0 is a negative outflow".into(),
        });
    }

    let schedule = match &financials.mortgage {
        Some(terms) => Some(match registry {
            Some(r) => r.resolve(terms, input.as_of)?,
            None => build_schedule(terms, input.as_of)?,
        }),
        None => None,
    };

    let (monthly_payment, _) = metrics::monthly_mortgage_payment(
        financials.mortgage.as_ref(),
        schedule.as_ref(),
        input.as_of,
    )?;
    let annual_debt_service = monthly_payment * dec!(12);

    let monthly_rent = financials.annual_rent / dec!(12);
    let annual_cash_flow =
        (monthly_rent - financials.monthly_expenses.monthly_total() - monthly_payment) * dec!(12);

    let years = input.years as usize;
    let mut flows = Vec::with_capacity(years + 1);
    flows.push(-financials.total_investment);
    for _ in 0..years {
        flows.push(annual_cash_flow);
    }

    // terminal value: capitalized NOI when usable, flat appreciation otherwise
    let noi = metrics::noi(financials);
    let capitalized = input
        .exit_cap_rate
        .filter(|cap| *cap > Decimal::ZERO)
        .and_then(|cap| noi.checked_div(cap / dec!(100)))
        .filter(|fv| *fv > Decimal::ZERO);

    let (future_value, terminal_basis) = match capitalized {
        Some(fv) => (fv, TerminalBasis::ExitCap),
        None => (
            financials.current_market_value
                * FALLBACK_APPRECIATION.powd(Decimal::from(input.years)),
            TerminalBasis::Appreciation,
        ),
    };

    // linear principal-reduction approximation of the exit balance
    let current_balance = financials
        .mortgage
        .as_ref()
        .map(|m| match m.current_balance {
            Some(b) if b > Decimal::ZERO => b,
            _ => m.original_amount,
        })
        .unwrap_or(Decimal::ZERO);

    let annual_interest = metrics::annual_mortgage_interest(schedule.as_ref(), input.as_of);
    let annual_principal = (annual_debt_service - annual_interest).max(Decimal::ZERO);
    let future_balance =
        (current_balance - annual_principal * Decimal::from(input.years)).max(Decimal::ZERO);

    let selling_costs = future_value * input.selling_costs_percent / dec!(100);
    let net_sale_proceeds = future_value - future_balance - selling_costs;

    if let Some(last) = flows.last_mut() {
        *last += net_sale_proceeds;
    }

    Ok(ProjectedCashFlows {
        flows,
        future_value,
        future_balance,
        net_sale_proceeds,
        terminal_basis,
    })
}

/// Project the holding-period IRR for a property.
pub fn project_irr(
    input: &IrrProjectionInput,
    registry: Option<&ScheduleRegistry>,
) -> PropFinResult<ComputationOutput<IrrProjection>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let cash_flows = build_cash_flows(input, registry)?;

    if input.exit_cap_rate.is_some() && cash_flows.terminal_basis == TerminalBasis::Appreciation {
        warnings.push(
            "Exit cap rate unusable for this property; terminal value fell back to 3% annual appreciation".into(),
        );
    }

    let options = IrrOptions {
        max_iterations: input.max_iterations.unwrap_or(PRODUCTION_MAX_ITERATIONS),
        ..IrrOptions::default()
    };
    let outcome = solve_irr(&cash_flows.flows, &options)?;

    if !outcome.converged {
        warnings.push(format!(
            "IRR did not converge within {} iterations; result is indicative",
            options.max_iterations
        ));
    }
    if outcome.clamped {
        warnings.push(format!(
            "IRR clamped to the [{IRR_FLOOR_PERCENT}%, {IRR_CEILING_PERCENT}%] reporting bound"
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Holding-Period IRR (Newton-Raphson)",
        input,
        warnings,
        elapsed,
        IrrProjection {
            cash_flows,
            outcome,
        },
    ))
}
