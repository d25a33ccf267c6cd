use chrono::{Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use propfin_core::investment::irr::{project_irr, IrrProjectionInput};
use propfin_core::types::PropertyFinancials;

use crate::input;

/// Arguments for holding-period IRR projection
#[derive(Args)]
pub struct IrrArgs {
    /// Path to a JSON or YAML file with the property's financials
    #[arg(long)]
    pub input: Option<String>,

    /// Holding period in years
    #[arg(long, default_value = "10")]
    pub years: u32,

    /// Exit cap rate as a percentage (e.g. 5.5); omit to assume 3%
    /// annual appreciation
    #[arg(long)]
    pub exit_cap_rate: Option<Decimal>,

    /// Selling costs as a percentage of the sale price
    #[arg(long, default_value = "5.0")]
    pub selling_costs: Decimal,

    /// Newton-Raphson iteration budget
    #[arg(long, default_value = "100")]
    pub max_iterations: u32,

    /// Projection start date; defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let financials: PropertyFinancials = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input is required (or pipe financials on stdin)".into());
    };

    if args.selling_costs < Decimal::ZERO || args.selling_costs >= dec!(100) {
        return Err("--selling-costs must be in [0, 100)".into());
    }

    let input = IrrProjectionInput {
        financials,
        years: args.years,
        exit_cap_rate: args.exit_cap_rate,
        selling_costs_percent: args.selling_costs,
        as_of: args.as_of.unwrap_or_else(|| Local::now().date_naive()),
        max_iterations: Some(args.max_iterations),
    };

    let output = project_irr(&input, None)?;
    Ok(serde_json::to_value(output)?)
}
