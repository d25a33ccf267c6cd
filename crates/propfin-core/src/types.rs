use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[cfg(feature = "mortgage")]
use crate::mortgage::frequency::PaymentFrequency;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Metric outputs the host application renders directly, expressed ×100
/// (6.25 = 6.25%). Inputs stay `Rate`; only derived metrics use this.
pub type Percent = Decimal;

/// Fixed vs. variable rate mortgage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateType {
    Fixed,
    Variable,
}

/// Contractual terms of a mortgage, as recorded at origination.
///
/// Immutable once constructed. `current_balance`, when present and positive,
/// is authoritative and overrides any balance derived from elapsed time.
#[cfg(feature = "mortgage")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageTerms {
    pub original_amount: Money,
    /// Nominal annual rate as a decimal (0.0549 = 5.49%).
    pub interest_rate: Rate,
    pub rate_type: RateType,
    pub amortization_years: u32,
    pub payment_frequency: PaymentFrequency,
    pub start_date: NaiveDate,
    /// Live balance from the lender, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_balance: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_months: Option<u32>,
    /// Lender-stated periodic payment. First choice when deriving debt
    /// service; the annuity formula is the fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<Money>,
    /// Lender account reference. Keys the authoritative-schedule lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lender_reference: Option<String>,
}

/// One row of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// 1-based, sequential, renumbered after any sort.
    pub payment_number: u32,
    pub payment_date: NaiveDate,
    pub total_payment: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    /// Non-increasing across the sequence; exactly zero on the final record.
    pub remaining_balance: Money,
}

/// A complete schedule of payments reducing a loan to zero.
///
/// A schedule is a value: recomputed whenever an input changes, never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub payments: Vec<PaymentRecord>,
    pub total_interest: Money,
    pub total_payment_count: u32,
    pub final_payment_date: NaiveDate,
}

impl AmortizationSchedule {
    /// Index of the first payment dated on or after `as_of`, if any.
    pub fn next_payment_index(&self, as_of: NaiveDate) -> Option<usize> {
        self.payments.iter().position(|p| p.payment_date >= as_of)
    }

    /// The first payment dated on or after `as_of`, falling back to the
    /// last record when every payment is in the past.
    pub fn next_payment(&self, as_of: NaiveDate) -> Option<&PaymentRecord> {
        match self.next_payment_index(as_of) {
            Some(i) => self.payments.get(i),
            None => self.payments.last(),
        }
    }
}

/// Monthly operating expenses for a property. Debt service is tracked
/// separately and never included here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatingExpenses {
    pub property_tax: Money,
    pub condo_fees: Money,
    pub insurance: Money,
    pub maintenance: Money,
    pub professional_fees: Money,
    pub utilities: Money,
}

impl OperatingExpenses {
    pub fn monthly_total(&self) -> Money {
        self.property_tax
            + self.condo_fees
            + self.insurance
            + self.maintenance
            + self.professional_fees
            + self.utilities
    }
}

/// Read-only financial snapshot of a property, assembled by the caller
/// from persisted records.
#[cfg(feature = "mortgage")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyFinancials {
    pub annual_rent: Money,
    pub monthly_expenses: OperatingExpenses,
    /// Clamped to [0, 1] before use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacancy_rate: Option<Rate>,
    pub current_market_value: Money,
    pub total_investment: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mortgage: Option<MortgageTerms>,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
