use clap::Args;
use serde_json::Value;
use std::fs;

use propfin_core::mortgage::statement::parse_payment_history;

/// Arguments for lender payment-history import
#[derive(Args)]
pub struct StatementArgs {
    /// Path to the lender CSV export (Date, Principal Paid, Interest Paid,
    /// Total Paid, Principal Balance)
    #[arg(long)]
    pub file: String,
}

pub fn run_statement(args: StatementArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(&args.file)
        .map_err(|e| format!("Failed to read '{}': {}", args.file, e))?;

    let output = parse_payment_history(&contents)?;
    Ok(serde_json::to_value(output)?)
}
