use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cash_flow::bfit::{assemble_bfit, BfitCashFlow, BfitInput, NpiKind};
use crate::dda::{allocate_dda, AllocationContext, CapitalInvestment, DdaResult, DepletionVolumes};
use crate::income_tax::{
    apply_carry_forward, income_tax, theoretical_taxable_income, IncomeTax, IncomeTaxOptions,
    TaxableIncome,
};
use crate::time_axis::DateContext;
use crate::types::{with_metadata, ComputationOutput, Rate, Series};
use crate::EngineResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// After income tax cash flow input, built on a finished BFIT result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AfitInput {
    pub dates: DateContext,
    pub bfit_cf_dict: BfitCashFlow,
    /// Kind of net profit interest the BFIT was computed with, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npi_type: Option<NpiKind>,
    #[serde(default)]
    pub all_capex: Vec<CapitalInvestment>,
    /// Original working interest per axis month
    pub working_interest: Series,
    #[serde(default)]
    pub volumes: DepletionVolumes,
    #[serde(default)]
    pub income_tax: IncomeTaxOptions,
}

/// BFIT inputs plus everything AFIT needs, run end to end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellCashFlowInput {
    #[serde(flatten)]
    pub bfit: BfitInput,
    #[serde(default)]
    pub all_capex: Vec<CapitalInvestment>,
    pub working_interest: Series,
    #[serde(default)]
    pub volumes: DepletionVolumes,
    #[serde(default)]
    pub income_tax: IncomeTaxOptions,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AfitCashFlow {
    pub time: Vec<i64>,
    pub bfit_cf: Series,
    #[serde(flatten)]
    pub dda: DdaResult,
    pub taxable_income: Series,
    pub loss_carry_forward: Series,
    pub state_tax_rate: Series,
    pub federal_tax_rate: Series,
    pub state_income_tax: Series,
    pub federal_income_tax: Series,
    pub afit_cf: Series,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AfitOutput {
    pub afit_cf_dict: AfitCashFlow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellCashFlow {
    pub bfit_cf_dict: BfitCashFlow,
    pub afit_cf_dict: AfitCashFlow,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

pub fn after_income_tax_cash_flow(input: &AfitInput) -> EngineResult<ComputationOutput<AfitOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let afit = assemble_afit(
        &input.dates,
        &input.bfit_cf_dict,
        input.npi_type,
        &input.all_capex,
        &input.working_interest,
        &input.volumes,
        &input.income_tax,
        &mut warnings,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "After income tax cash flow: DD&A, loss carry-forward, state then federal tax",
        &assumptions(&input.income_tax, input.npi_type, input.all_capex.len()),
        warnings,
        elapsed,
        AfitOutput { afit_cf_dict: afit },
    ))
}

/// BFIT followed by AFIT for one well.
pub fn calculate_well_cash_flow(
    input: &WellCashFlowInput,
) -> EngineResult<ComputationOutput<WellCashFlow>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let bfit = assemble_bfit(&input.bfit, &[])?;
    let npi_type = input.bfit.npi.as_ref().map(|n| n.kind);
    let afit = assemble_afit(
        &input.bfit.dates,
        &bfit,
        npi_type,
        &input.all_capex,
        &input.working_interest,
        &input.volumes,
        &input.income_tax,
        &mut warnings,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Before and after income tax cash flow",
        &assumptions(&input.income_tax, npi_type, input.all_capex.len()),
        warnings,
        elapsed,
        WellCashFlow {
            bfit_cf_dict: bfit,
            afit_cf_dict: afit,
        },
    ))
}

fn assumptions(
    options: &IncomeTaxOptions,
    npi_type: Option<NpiKind>,
    investments: usize,
) -> serde_json::Value {
    serde_json::json!({
        "fifteen_depletion": options.fifteen_depletion,
        "carry_forward": options.carry_forward,
        "npi_type": npi_type,
        "investments": investments,
    })
}

#[allow(clippy::too_many_arguments)]
fn assemble_afit(
    dates: &DateContext,
    bfit: &BfitCashFlow,
    npi_type: Option<NpiKind>,
    all_capex: &[CapitalInvestment],
    working_interest: &[Rate],
    volumes: &DepletionVolumes,
    options: &IncomeTaxOptions,
    warnings: &mut Vec<String>,
) -> EngineResult<AfitCashFlow> {
    let axis = dates.time_axis()?;
    axis.check_len("bfit_cf", &bfit.bfit_cf)?;
    axis.check_len("capex", &bfit.capex)?;
    axis.check_len("total_net_revenue", &bfit.total_net_revenue)?;
    axis.check_len("total_gross_revenue", &bfit.total_gross_revenue)?;

    let state_tax_rate = options
        .state_income_tax
        .resolve("state_income_tax", &axis, dates.as_of_date)?;
    let federal_tax_rate = options
        .federal_income_tax
        .resolve("federal_income_tax", &axis, dates.as_of_date)?;

    // A revenue interest holder's cash flow is taxed as received: no DD&A, no tax.
    if npi_type == Some(NpiKind::Revenue) {
        debug!("revenue NPI, bypassing DD&A and income tax");
        return Ok(AfitCashFlow {
            time: axis.offsets().to_vec(),
            bfit_cf: bfit.bfit_cf.clone(),
            dda: DdaResult::zeros(axis.len()),
            taxable_income: bfit.bfit_cf.clone(),
            loss_carry_forward: axis.zeros(),
            state_tax_rate,
            federal_tax_rate,
            state_income_tax: axis.zeros(),
            federal_income_tax: axis.zeros(),
            afit_cf: bfit.bfit_cf.clone(),
        });
    }

    let ctx = AllocationContext {
        axis: &axis,
        as_of_date: dates.as_of_date,
        first_production_date: dates.first_production_date,
        working_interest,
        volumes,
    };
    let dda = allocate_dda(
        all_capex,
        &ctx,
        &bfit.total_net_revenue,
        &bfit.total_gross_revenue,
        options.fifteen_depletion,
        warnings,
    )?;

    let theoretical = theoretical_taxable_income(&bfit.bfit_cf, &bfit.capex, &dda.total_deductions);
    let TaxableIncome {
        taxable_income,
        loss_carry_forward,
    } = apply_carry_forward(
        &theoretical,
        options.carry_forward,
        axis.date_at(dates.as_of_date, 0)?,
    )?;
    let IncomeTax {
        state_income_tax,
        federal_income_tax,
    } = income_tax(&taxable_income, &state_tax_rate, &federal_tax_rate)?;

    let afit_cf: Series = bfit
        .bfit_cf
        .iter()
        .zip(&state_income_tax)
        .zip(&federal_income_tax)
        .zip(&dda.columns.tax_credit)
        .map(|(((cf, state), federal), credit)| cf - state - federal + credit)
        .collect();

    Ok(AfitCashFlow {
        time: axis.offsets().to_vec(),
        bfit_cf: bfit.bfit_cf.clone(),
        dda,
        taxable_income,
        loss_carry_forward,
        state_tax_rate,
        federal_tax_rate,
        state_income_tax,
        federal_income_tax,
        afit_cf,
    })
}
