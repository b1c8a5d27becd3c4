use clap::Args;
use serde_json::Value;

use well_cashflow_core::dda::{self, DdaInput};
use well_cashflow_core::types::YesNo;

use crate::input;

/// Arguments for a standalone DD&A schedule
#[derive(Args)]
pub struct DdaArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Apply the 15% statutory depletion floor regardless of the input file
    #[arg(long)]
    pub fifteen_depletion: bool,
}

pub fn run_dda(args: DdaArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut dda_input: DdaInput = input::read_input(args.input.as_deref(), "DD&A")?;
    if args.fifteen_depletion {
        dda_input.fifteen_depletion = YesNo::Yes;
    }
    let result = dda::calculate_dda(&dda_input)?;
    Ok(serde_json::to_value(result)?)
}
