use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::dda::depletion::allocate_depletion;
use crate::dda::depreciation::allocate_depreciation;
use crate::dda::model::{
    AllocationContext, AllocationModel, CapitalInvestment, DdaColumns, DepletionVolumes,
    DepreciationModelSpec,
};
use crate::time_axis::{max_series, DateContext};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Series, YesNo};
use crate::EngineResult;

/// Statutory percentage-depletion rate applied to gross revenue
pub const STATUTORY_DEPLETION_RATE: Rate = dec!(0.15);

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

/// Standalone DD&A calculation input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdaInput {
    pub dates: DateContext,
    /// Capital investments
    #[serde(default)]
    pub capex: Vec<CapitalInvestment>,
    /// Working interest per axis month
    pub working_interest: Series,
    #[serde(default)]
    pub volumes: DepletionVolumes,
    pub net_revenue: Series,
    pub gross_revenue: Series,
    #[serde(default)]
    pub fifteen_depletion: YesNo,
}

/// Combined DD&A of every investment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdaResult {
    #[serde(flatten)]
    pub columns: DdaColumns,
    pub percentage_depletion: Series,
    /// max(depreciation + depletion, percentage depletion)
    pub total_deductions: Series,
}

impl DdaResult {
    pub fn zeros(len: usize) -> Self {
        Self {
            columns: DdaColumns::zeros(len),
            percentage_depletion: vec![Decimal::ZERO; len],
            total_deductions: vec![Decimal::ZERO; len],
        }
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Run the DD&A aggregation on a standalone input.
pub fn calculate_dda(input: &DdaInput) -> EngineResult<ComputationOutput<DdaResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let axis = input.dates.time_axis()?;
    let ctx = AllocationContext {
        axis: &axis,
        as_of_date: input.dates.as_of_date,
        first_production_date: input.dates.first_production_date,
        working_interest: &input.working_interest,
        volumes: &input.volumes,
    };
    let result = allocate_dda(
        &input.capex,
        &ctx,
        &input.net_revenue,
        &input.gross_revenue,
        input.fifteen_depletion,
        &mut warnings,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Per-investment depreciation/depletion allocation with statutory depletion floor",
        &serde_json::json!({
            "investments": input.capex.len(),
            "fifteen_depletion": input.fifteen_depletion,
            "months": axis.len(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// Allocate every investment and apply the statutory depletion floor.
///
/// Any allocator error aborts the whole aggregation.
pub fn allocate_dda(
    investments: &[CapitalInvestment],
    ctx: &AllocationContext<'_>,
    net_revenue: &[Money],
    gross_revenue: &[Money],
    fifteen_depletion: YesNo,
    warnings: &mut Vec<String>,
) -> EngineResult<DdaResult> {
    let axis = ctx.axis;

    // Well life ends before production starts: nothing is ever deducted.
    if axis.last() <= 0 {
        debug!(last_offset = axis.last(), "time axis ends before first production, DD&A is zero");
        return Ok(DdaResult::zeros(axis.len()));
    }

    let mut columns = DdaColumns::zeros(axis.len());
    for investment in investments {
        let allocated = match &investment.depreciation_model {
            DepreciationModelSpec::None => continue,
            DepreciationModelSpec::Model(AllocationModel::Depreciation(params)) => {
                allocate_depreciation(investment, params, ctx)?
            }
            DepreciationModelSpec::Model(AllocationModel::Depletion(params)) => {
                allocate_depletion(investment, params, ctx, warnings)?
            }
        };
        columns = columns.merge(&allocated);
    }

    let percentage_depletion = if fifteen_depletion.is_yes() {
        axis.check_len("net_revenue", net_revenue)?;
        axis.check_len("gross_revenue", gross_revenue)?;
        percentage_depletion(net_revenue, gross_revenue)
    } else {
        axis.zeros()
    };
    let total_deductions = max_series(&columns.total(), &percentage_depletion);

    Ok(DdaResult {
        columns,
        percentage_depletion,
        total_deductions,
    })
}

/// Statutory depletion per month: 15% of gross revenue, limited to net
/// revenue when net revenue is the smaller of the two, never negative.
pub fn percentage_depletion(net_revenue: &[Money], gross_revenue: &[Money]) -> Series {
    net_revenue
        .iter()
        .zip(gross_revenue)
        .map(|(net, gross)| {
            let cap = gross * STATUTORY_DEPLETION_RATE;
            if *net <= cap {
                (*net).min(cap).max(Decimal::ZERO)
            } else {
                cap
            }
        })
        .collect()
}
