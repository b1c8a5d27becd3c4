use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::dda::model::{
    AllocationContext, CapitalInvestment, DdaColumns, DepletionMethod, DepletionParams,
};
use crate::time_axis::{add_series, months_between, place_at, safe_divide};
use crate::types::{Money, Phase, Series, Volume};
use crate::EngineResult;

const HUNDRED: Decimal = dec!(100);
const GAS_MCF_PER_BOE: Decimal = dec!(6);

/// Depletion for one investment, aligned to the axis.
///
/// `warnings` collects silent degradations (missing reserve volumes).
pub fn allocate_depletion(
    investment: &CapitalInvestment,
    params: &DepletionParams,
    ctx: &AllocationContext<'_>,
    warnings: &mut Vec<String>,
) -> EngineResult<DdaColumns> {
    let (tangible, intangible) = investment.scaled_amounts(ctx)?;

    debug!(
        investment = %investment.label(),
        tangible_method = ?params.tangible_method,
        intangible_method = ?params.intangible_method,
        "allocating depletion"
    );

    // Tangible and intangible share reserves, so a degradation is reported once.
    let mut degraded = Vec::new();
    let tangible_depletion = deplete(
        tangible,
        params.tangible_immediate_pct,
        params.tangible_method,
        investment,
        ctx,
        &mut degraded,
    );
    let intangible_depletion = deplete(
        intangible,
        params.intangible_immediate_pct,
        params.intangible_method,
        investment,
        ctx,
        &mut degraded,
    );
    degraded.dedup();
    for msg in degraded {
        warn!("{msg}");
        warnings.push(msg);
    }

    Ok(DdaColumns {
        depletion: add_series(&tangible_depletion, &intangible_depletion),
        tangible_depletion,
        intangible_depletion,
        ..DdaColumns::zeros(ctx.axis.len())
    })
}

/// Immediate portion in the investment month plus the remaining base spread
/// by the method's allocation rates.
fn deplete(
    amount: Money,
    immediate_pct: Decimal,
    method: DepletionMethod,
    investment: &CapitalInvestment,
    ctx: &AllocationContext<'_>,
    warnings: &mut Vec<String>,
) -> Series {
    let immediate = amount * immediate_pct / HUNDRED;
    let base = amount - immediate;

    let rates = depletion_rates(method, investment, ctx, warnings);
    let spread: Series = rates.iter().map(|r| base * r).collect();
    add_series(&spread, &place_at(immediate, investment.time, ctx.axis))
}

/// Allocation rate per axis month, not yet scaled by the depletable base.
pub fn depletion_rates(
    method: DepletionMethod,
    investment: &CapitalInvestment,
    ctx: &AllocationContext<'_>,
    warnings: &mut Vec<String>,
) -> Series {
    let axis = ctx.axis;
    let mut rates = axis.zeros();
    match method {
        DepletionMethod::Never => {}
        DepletionMethod::Ecl => {
            let last = rates.len() - 1;
            rates[last] = Decimal::ONE;
        }
        DepletionMethod::Fpd => {
            let idx = ctx
                .first_production_date
                .and_then(|fpd| axis.index_of(months_between(ctx.as_of_date, fpd)))
                .unwrap_or(0);
            rates[idx] = Decimal::ONE;
        }
        DepletionMethod::UnitOfProductionMajor => {
            let phase = ctx.volumes.primary_product;
            let produced = phase_volume(&ctx.volumes.wellhead, phase);
            let reserves = phase_volume(&ctx.volumes.unadjusted_wellhead, phase);
            rates = unit_of_production(&produced, &reserves, investment, ctx, warnings);
        }
        DepletionMethod::UnitOfProductionBoe => {
            let produced = boe(
                &phase_volume(&ctx.volumes.wellhead, Phase::Oil),
                &phase_volume(&ctx.volumes.wellhead, Phase::Gas),
            );
            let reserves = boe(
                &phase_volume(&ctx.volumes.unadjusted_wellhead, Phase::Oil),
                &phase_volume(&ctx.volumes.unadjusted_wellhead, Phase::Gas),
            );
            rates = unit_of_production(&produced, &reserves, investment, ctx, warnings);
        }
    }
    rates
}

/// Production in month `m` over reserves remaining from the investment month.
///
/// Months before the investment get a zero rate. When no reserve volume is
/// available every month gets a rate of one.
fn unit_of_production(
    produced: &[Volume],
    reserves: &[Volume],
    investment: &CapitalInvestment,
    ctx: &AllocationContext<'_>,
    warnings: &mut Vec<String>,
) -> Series {
    let axis = ctx.axis;
    if reserves.is_empty() {
        let msg = format!(
            "{}: no unadjusted wellhead volume, unit-of-production rate defaults to 1.0",
            investment.label()
        );
        warnings.push(msg);
        return vec![Decimal::ONE; axis.len()];
    }

    let first = (investment.time - axis.start()).max(0) as usize;
    let remaining: Volume = reserves.iter().skip(first).sum();

    (0..axis.len())
        .map(|m| {
            if m < first {
                Decimal::ZERO
            } else {
                let volume = produced.get(m).copied().unwrap_or(Decimal::ZERO);
                safe_divide(volume, remaining, Decimal::ONE)
            }
        })
        .collect()
}

fn phase_volume(volumes: &BTreeMap<Phase, Vec<Volume>>, phase: Phase) -> Vec<Volume> {
    volumes.get(&phase).cloned().unwrap_or_default()
}

/// Oil plus gas / 6, over the longer of the two series.
fn boe(oil: &[Volume], gas: &[Volume]) -> Vec<Volume> {
    let len = oil.len().max(gas.len());
    (0..len)
        .map(|i| {
            let o = oil.get(i).copied().unwrap_or(Decimal::ZERO);
            let g = gas.get(i).copied().unwrap_or(Decimal::ZERO);
            o + g / GAS_MCF_PER_BOE
        })
        .collect()
}
