use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use propfin_core::transfer_tax::{calculate_ltt, LttInput};

use crate::input;

/// Arguments for land transfer tax
#[derive(Args)]
pub struct LttArgs {
    /// Path to a JSON or YAML file with the purchase details
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Municipality; Toronto adds the municipal tax
    #[arg(long)]
    pub city: Option<String>,

    /// Province code (only ON is taxed)
    #[arg(long, default_value = "ON")]
    pub province: String,

    /// Closing date selecting the rate schedule (YYYY-MM-DD)
    #[arg(long)]
    pub closing_date: Option<NaiveDate>,

    /// Manual amount from a statement of adjustments; bypasses computation
    #[arg(long)]
    pub manual_override: Option<Decimal>,
}

pub fn run_ltt(args: LttArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ltt_input: LttInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LttInput {
            price: args.price.ok_or("--price is required (or provide --input)")?,
            city: args.city.ok_or("--city is required (or provide --input)")?,
            province: args.province,
            closing_date: args.closing_date,
            manual_override: args.manual_override,
        }
    };

    let output = calculate_ltt(&ltt_input)?;
    Ok(serde_json::to_value(output)?)
}
