use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::dda::model::{AllocationContext, CapitalInvestment, DdaColumns, DepreciationParams};
use crate::time_axis::{add_series, align_to_axis, place_at};
use crate::types::Money;
use crate::EngineResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const HUNDRED: Decimal = dec!(100);
const MONTHS_IN_YEAR: usize = 12;
const FINAL_YEAR_MONTHS: usize = 6;

/// Statutory bonus-depreciation percentage by placed-in-service date,
/// oldest first. The latest entry on or before the investment date applies.
const BONUS_SCHEDULE: [((i32, u32, u32), Decimal); 12] = [
    ((2001, 9, 11), dec!(30)),
    ((2003, 5, 6), dec!(50)),
    ((2005, 1, 1), dec!(0)),
    ((2008, 1, 1), dec!(50)),
    ((2010, 9, 9), dec!(100)),
    ((2012, 1, 1), dec!(50)),
    ((2017, 9, 28), dec!(100)),
    ((2023, 1, 1), dec!(80)),
    ((2024, 1, 1), dec!(60)),
    ((2025, 1, 1), dec!(40)),
    ((2026, 1, 1), dec!(20)),
    ((2027, 1, 1), dec!(0)),
];

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Depreciation and tax credit for one investment, aligned to the axis.
pub fn allocate_depreciation(
    investment: &CapitalInvestment,
    params: &DepreciationParams,
    ctx: &AllocationContext<'_>,
) -> EngineResult<DdaColumns> {
    let axis = ctx.axis;
    let (tangible, intangible) = investment.scaled_amounts(ctx)?;

    let investment_date = investment.date(ctx.as_of_date)?;
    let remaining_months = 13 - investment_date.month() as usize;

    let statutory_bonus = if params.tcja_bonus.is_yes() {
        statutory_bonus_pct(investment_date)
    } else {
        Decimal::ZERO
    };
    let bonus_pct = match params.bonus_depreciation_pct {
        Some(extra) => (statutory_bonus + extra).min(HUNDRED),
        None => statutory_bonus,
    };

    debug!(
        investment = %investment.label(),
        %investment_date,
        remaining_months,
        %bonus_pct,
        "allocating depreciation"
    );

    let tangible_depreciation = align_to_axis(
        &depreciation_schedule(tangible, &params.tangible_factors, remaining_months, bonus_pct),
        investment.time,
        axis,
    );
    let intangible_depreciation = align_to_axis(
        &depreciation_schedule(intangible, &params.intangible_factors, remaining_months, bonus_pct),
        investment.time,
        axis,
    );

    let tax_credit = match params.tax_credit_pct {
        Some(pct) => place_at(pct * tangible / HUNDRED, investment.time, axis),
        None => axis.zeros(),
    };

    Ok(DdaColumns {
        depreciation: add_series(&tangible_depreciation, &intangible_depreciation),
        tangible_depreciation,
        intangible_depreciation,
        tax_credit,
        ..DdaColumns::zeros(axis.len())
    })
}

/// Monthly depreciation of `amount` starting in the investment month.
///
/// The first year covers the months left in the investment's calendar year,
/// the last year covers six months and every year in between covers twelve.
/// A single-factor schedule is treated as a first year. The regular schedule
/// is scaled by `1 - bonus` and the bonus itself is spread evenly over the
/// first `remaining_months` months.
pub fn depreciation_schedule(
    amount: Money,
    yearly_factors: &[Decimal],
    remaining_months: usize,
    bonus_pct: Decimal,
) -> Vec<Money> {
    let bonus = bonus_pct / HUNDRED;
    let keep = Decimal::ONE - bonus;
    let years = yearly_factors.len();

    let mut schedule = Vec::with_capacity(remaining_months + years * MONTHS_IN_YEAR);
    for (year, factor) in yearly_factors.iter().enumerate() {
        let months = if year == 0 {
            remaining_months
        } else if year == years - 1 {
            FINAL_YEAR_MONTHS
        } else {
            MONTHS_IN_YEAR
        };
        let monthly = amount * factor * keep / (HUNDRED * Decimal::from(months as u64));
        schedule.extend(std::iter::repeat(monthly).take(months));
    }

    if bonus.is_zero() {
        return schedule;
    }
    if schedule.len() < remaining_months {
        schedule.resize(remaining_months, Decimal::ZERO);
    }
    let per_month = amount * bonus / Decimal::from(remaining_months as u64);
    for month in schedule.iter_mut().take(remaining_months) {
        *month += per_month;
    }
    schedule
}

/// Statutory bonus percentage in force on `date`.
pub fn statutory_bonus_pct(date: NaiveDate) -> Decimal {
    let key = (date.year(), date.month(), date.day());
    BONUS_SCHEDULE
        .iter()
        .rev()
        .find(|(start, _)| *start <= key)
        .map(|(_, pct)| *pct)
        .unwrap_or(Decimal::ZERO)
}
