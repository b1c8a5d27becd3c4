use clap::Args;
use serde_json::Value;

use well_cashflow_core::cash_flow::{
    self, AfitInput, BfitInput, GroupBfitInput, GroupCaseBfitInput, WellCashFlowInput,
};

use crate::input;

/// Arguments for a single-well BFIT run
#[derive(Args)]
pub struct BfitArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_bfit(args: BfitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bfit_input: BfitInput = input::read_input(args.input.as_deref(), "BFIT cash flow")?;
    let result = cash_flow::before_income_tax_cash_flow(&bfit_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a group-level BFIT run
#[derive(Args)]
pub struct GroupBfitArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_group_bfit(args: GroupBfitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let group_input: GroupBfitInput = input::read_input(args.input.as_deref(), "group BFIT")?;
    let result = cash_flow::group_before_income_tax_cash_flow(&group_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a group case BFIT run
#[derive(Args)]
pub struct GroupCaseBfitArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_group_case_bfit(args: GroupCaseBfitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let case_input: GroupCaseBfitInput =
        input::read_input(args.input.as_deref(), "group case BFIT")?;
    let result = cash_flow::group_case_before_income_tax_cash_flow(&case_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for AFIT from a precomputed BFIT result
#[derive(Args)]
pub struct AfitArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_afit(args: AfitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let afit_input: AfitInput = input::read_input(args.input.as_deref(), "AFIT cash flow")?;
    let result = cash_flow::after_income_tax_cash_flow(&afit_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a chained BFIT and AFIT run
#[derive(Args)]
pub struct CashFlowArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Only print the BFIT half
    #[arg(long)]
    pub bfit_only: bool,
}

pub fn run_cash_flow(args: CashFlowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let well_input: WellCashFlowInput = input::read_input(args.input.as_deref(), "well cash flow")?;
    if args.bfit_only {
        let result = cash_flow::before_income_tax_cash_flow(&well_input.bfit)?;
        return Ok(serde_json::to_value(result)?);
    }
    let result = cash_flow::calculate_well_cash_flow(&well_input)?;
    Ok(serde_json::to_value(result)?)
}
