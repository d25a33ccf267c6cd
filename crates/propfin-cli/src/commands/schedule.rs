use chrono::{Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use propfin_core::mortgage::frequency::PaymentFrequency;
use propfin_core::mortgage::schedule::build_schedule;
use propfin_core::types::{MortgageTerms, RateType};

use crate::input;

/// Arguments for amortization schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to a JSON or YAML file with mortgage terms (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Original loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual interest rate (e.g. 0.0519 for 5.19%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization period in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Payment frequency: monthly, semi-monthly, bi-weekly,
    /// accelerated-bi-weekly, weekly, accelerated-weekly
    #[arg(long, default_value = "monthly")]
    pub frequency: String,

    /// First day of the loan (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Authoritative current balance; resumes the schedule mid-stream
    #[arg(long)]
    pub current_balance: Option<Decimal>,

    /// Schedule positioning date; defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: MortgageTerms = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        MortgageTerms {
            original_amount: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            interest_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            rate_type: RateType::Fixed,
            amortization_years: args
                .years
                .ok_or("--years is required (or provide --input)")?,
            payment_frequency: args.frequency.parse::<PaymentFrequency>()?,
            start_date: args
                .start_date
                .ok_or("--start-date is required (or provide --input)")?,
            current_balance: args.current_balance,
            term_months: None,
            payment_amount: None,
            lender_reference: None,
        }
    };

    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let schedule = build_schedule(&terms, as_of)?;

    Ok(serde_json::to_value(schedule)?)
}
