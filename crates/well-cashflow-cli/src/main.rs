mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::cash_flow::{AfitArgs, BfitArgs, CashFlowArgs, GroupBfitArgs, GroupCaseBfitArgs};
use commands::dda::DdaArgs;
use commands::income_tax::TaxableIncomeArgs;

/// Monthly before/after income tax cash flow for oil & gas wells
#[derive(Parser)]
#[command(
    name = "wcf",
    version,
    about = "Monthly before/after income tax cash flow for oil & gas wells",
    long_about = "A CLI for the tax half of a well economics run with decimal precision. \
                  Builds BFIT cash flow from revenue, expense, production tax and capex, \
                  then DD&A, loss carry-forward and state/federal income tax for AFIT."
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
    /// Before income tax cash flow for one well
    Bfit(BfitArgs),
    /// Before income tax cash flow for a group, rolling up member totals
    GroupBfit(GroupBfitArgs),
    /// Before income tax cash flow for a case inside a group
    GroupCaseBfit(GroupCaseBfitArgs),
    /// After income tax cash flow from a finished BFIT result
    Afit(AfitArgs),
    /// BFIT then AFIT for one well
    CashFlow(CashFlowArgs),
    /// Depreciation, depletion and amortization schedule
    Dda(DdaArgs),
    /// Taxable income with loss carry-forward
    TaxableIncome(TaxableIncomeArgs),
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
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Bfit(args) => commands::cash_flow::run_bfit(args),
        Commands::GroupBfit(args) => commands::cash_flow::run_group_bfit(args),
        Commands::GroupCaseBfit(args) => commands::cash_flow::run_group_case_bfit(args),
        Commands::Afit(args) => commands::cash_flow::run_afit(args),
        Commands::CashFlow(args) => commands::cash_flow::run_cash_flow(args),
        Commands::Dda(args) => commands::dda::run_dda(args),
        Commands::TaxableIncome(args) => commands::income_tax::run_taxable_income(args),
        Commands::Version => {
            println!("wcf {}", env!("CARGO_PKG_VERSION"));
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
