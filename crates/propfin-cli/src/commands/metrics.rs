use chrono::{Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use propfin_core::investment::metrics::{analyze_investment, InvestmentMetricsInput};
use propfin_core::types::PropertyFinancials;

use crate::input;

/// Arguments for investment metrics
#[derive(Args)]
pub struct MetricsArgs {
    /// Path to a JSON or YAML file with the property's financials
    #[arg(long)]
    pub input: Option<String>,

    /// Marginal tax rate for the interest-deduction figure (default 0.40)
    #[arg(long)]
    pub marginal_tax_rate: Option<Decimal>,

    /// Metrics positioning date; defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let financials: PropertyFinancials = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input is required (or pipe financials on stdin)".into());
    };

    let input = InvestmentMetricsInput {
        financials,
        as_of: args.as_of.unwrap_or_else(|| Local::now().date_naive()),
        marginal_tax_rate: args.marginal_tax_rate,
    };

    let output = analyze_investment(&input, None)?;
    Ok(serde_json::to_value(output)?)
}
