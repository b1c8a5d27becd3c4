use clap::Args;
use serde_json::Value;

use well_cashflow_core::income_tax::{self, TaxableIncomeInput};
use well_cashflow_core::types::YesNo;

use crate::input;

/// Arguments for taxable income with loss carry-forward
#[derive(Args)]
pub struct TaxableIncomeArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Carry net operating losses forward regardless of the input file
    #[arg(long)]
    pub carry_forward: bool,
}

pub fn run_taxable_income(args: TaxableIncomeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut ti_input: TaxableIncomeInput =
        input::read_input(args.input.as_deref(), "taxable income")?;
    if args.carry_forward {
        ti_input.carry_forward = YesNo::Yes;
    }
    let result = income_tax::calculate_taxable_income(&ti_input)?;
    Ok(serde_json::to_value(result)?)
}
