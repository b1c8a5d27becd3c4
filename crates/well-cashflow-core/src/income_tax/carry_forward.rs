use std::collections::VecDeque;
use std::time::Instant;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::time_axis::{add_months, add_series, sub_series, DateContext};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Series, YesNo};
use crate::EngineResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Losses arising on or after 1 January of this year never expire and are
/// limited to 20% of income.
pub const TCJA_FIRST_YEAR: i32 = 2018;

/// Lifetime of a loss that arose before the TCJA regime
pub const PRE_TCJA_EXPIRY_MONTHS: u32 = 240;

/// Share of a month's income a single TCJA loss may offset
pub const TCJA_OFFSET_LIMIT: Rate = dec!(0.2);

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// One queued net operating loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossEntry {
    pub amount: Money,
    /// `None` never expires
    pub months_to_expiry: Option<u32>,
}

/// Net operating losses, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarryForwardQueue {
    entries: VecDeque<LossEntry>,
}

impl CarryForwardQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LossEntry> {
        self.entries.iter()
    }

    /// Unconsumed loss across all entries.
    pub fn balance(&self) -> Money {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// Queue a loss incurred in the month of `date`.
    pub fn push_loss(&mut self, amount: Money, date: NaiveDate) {
        let months_to_expiry = if date.year() >= TCJA_FIRST_YEAR {
            None
        } else {
            Some(PRE_TCJA_EXPIRY_MONTHS)
        };
        self.entries.push_back(LossEntry {
            amount,
            months_to_expiry,
        });
    }

    /// Drop entries whose lifetime has run out.
    pub fn purge_expired(&mut self) {
        self.entries.retain(|e| e.months_to_expiry != Some(0));
    }

    /// One month passes for every finite entry.
    pub fn age(&mut self) {
        for entry in self.entries.iter_mut() {
            if let Some(months) = entry.months_to_expiry.as_mut() {
                *months = months.saturating_sub(1);
            }
        }
    }

    /// Offset positive `income` with queued losses, oldest first, and return
    /// what remains taxable.
    ///
    /// A TCJA entry may take at most 20% of `income` (the month's income as
    /// passed in, not what is left after earlier entries). A pre-TCJA entry
    /// may take everything that is left.
    pub fn offset(&mut self, income: Money) -> Money {
        let tcja_cap = income * TCJA_OFFSET_LIMIT;
        let mut remaining = income;
        for entry in self.entries.iter_mut() {
            if remaining <= Decimal::ZERO {
                break;
            }
            let available = match entry.months_to_expiry {
                None => entry.amount.min(tcja_cap),
                Some(_) => entry.amount,
            };
            let used = available.min(remaining);
            entry.amount -= used;
            remaining -= used;
        }
        self.entries.retain(|e| e.amount > Decimal::ZERO);
        remaining
    }
}

// ---------------------------------------------------------------------------
// Taxable income
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxableIncome {
    pub taxable_income: Series,
    /// Queue balance at the end of each month, before the final recognition
    pub loss_carry_forward: Series,
}

/// `bfit_cf + capex - deductions`, month by month.
pub fn theoretical_taxable_income(
    bfit_cf: &[Money],
    capex: &[Money],
    total_deductions: &[Money],
) -> Series {
    sub_series(&add_series(bfit_cf, capex), total_deductions)
}

/// Apply the loss carry-forward rules to a theoretical taxable income series.
///
/// `first_month` is the calendar month of the first entry. Without
/// carry-forward the series is returned unchanged.
pub fn apply_carry_forward(
    theoretical: &[Money],
    carry_forward: YesNo,
    first_month: NaiveDate,
) -> EngineResult<TaxableIncome> {
    if !carry_forward.is_yes() {
        return Ok(TaxableIncome {
            taxable_income: theoretical.to_vec(),
            loss_carry_forward: vec![Decimal::ZERO; theoretical.len()],
        });
    }

    let mut queue = CarryForwardQueue::new();
    let mut taxable_income = Vec::with_capacity(theoretical.len());
    let mut loss_carry_forward = Vec::with_capacity(theoretical.len());
    let mut cursor = first_month;

    for theo in theoretical {
        queue.purge_expired();
        if *theo >= Decimal::ZERO {
            taxable_income.push(queue.offset(*theo));
        } else {
            queue.push_loss(-*theo, cursor);
            taxable_income.push(Decimal::ZERO);
        }
        queue.age();
        loss_carry_forward.push(queue.balance());
        cursor = add_months(cursor, 1)?;
    }

    // Losses still unused at the end of well life are recognised in the last month.
    let unused = queue.balance();
    if let Some(last) = taxable_income.last_mut() {
        if !unused.is_zero() {
            debug!(%unused, "recognising unused carry-forward in final month");
        }
        *last -= unused;
    }

    Ok(TaxableIncome {
        taxable_income,
        loss_carry_forward,
    })
}

// ---------------------------------------------------------------------------
// Standalone calculation
// ---------------------------------------------------------------------------

/// Input for a standalone taxable-income run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxableIncomeInput {
    pub dates: DateContext,
    pub bfit_cf: Series,
    pub capex: Series,
    pub total_deductions: Series,
    #[serde(default)]
    pub carry_forward: YesNo,
}

pub fn calculate_taxable_income(
    input: &TaxableIncomeInput,
) -> EngineResult<ComputationOutput<TaxableIncome>> {
    let start = Instant::now();

    let axis = input.dates.time_axis()?;
    axis.check_len("bfit_cf", &input.bfit_cf)?;
    axis.check_len("capex", &input.capex)?;
    axis.check_len("total_deductions", &input.total_deductions)?;

    let theoretical =
        theoretical_taxable_income(&input.bfit_cf, &input.capex, &input.total_deductions);
    let result = apply_carry_forward(
        &theoretical,
        input.carry_forward,
        axis.date_at(input.dates.as_of_date, 0)?,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Taxable income with net operating loss carry-forward",
        &serde_json::json!({
            "carry_forward": input.carry_forward,
            "months": axis.len(),
        }),
        Vec::new(),
        elapsed,
        result,
    ))
}
