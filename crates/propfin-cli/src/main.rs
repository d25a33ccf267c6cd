mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::irr::IrrArgs;
use commands::ltt::LttArgs;
use commands::metrics::MetricsArgs;
use commands::schedule::ScheduleArgs;
use commands::statement::StatementArgs;

/// Mortgage amortization and rental-property investment analytics
#[derive(Parser)]
#[command(
    name = "pfa",
    version,
    about = "Mortgage amortization and rental-property investment analytics",
    long_about = "Deterministic amortization schedules across Canadian payment \
                  frequencies, investment metrics (NOI, cap rate, DSCR, \
                  cash-on-cash), holding-period IRR projections, and Ontario \
                  land transfer tax — all in exact decimal arithmetic."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a payment-by-payment amortization schedule
    Schedule(ScheduleArgs),
    /// Investment metrics for a property (NOI, cap rate, DSCR, cash flow)
    Metrics(MetricsArgs),
    /// Holding-period IRR projection with terminal sale proceeds
    Irr(IrrArgs),
    /// Ontario land transfer tax for a purchase
    Ltt(LttArgs),
    /// Import a lender payment-history CSV as an authoritative schedule
    Statement(StatementArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Metrics(args) => commands::metrics::run_metrics(args),
        Commands::Irr(args) => commands::irr::run_irr(args),
        Commands::Ltt(args) => commands::ltt::run_ltt(args),
        Commands::Statement(args) => commands::statement::run_statement(args),
        Commands::Version => {
            println!("pfa {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
