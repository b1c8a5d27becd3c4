use std::collections::BTreeMap;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::time_axis::{sub_series, sum_series, DateContext, TimeAxis};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Series};
use crate::EngineResult;

/// Keys that may appear next to the phases in an upstream revenue mapping but
/// are not phases themselves.
const AGGREGATE_REVENUE_KEYS: [&str; 2] = ["time", "compositionals"];

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRevenue {
    pub net_revenue: Series,
    pub gross_revenue: Series,
}

/// Revenue by phase and by NGL compositional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueInput {
    #[serde(default)]
    pub phases: BTreeMap<String, PhaseRevenue>,
    #[serde(default)]
    pub compositionals: BTreeMap<String, PhaseRevenue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseItem {
    pub values: Series,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInput {
    #[serde(default)]
    pub fixed_expenses: Vec<ExpenseItem>,
    #[serde(default)]
    pub variable_expenses: Vec<ExpenseItem>,
    #[serde(default)]
    pub water_disposal: Vec<ExpenseItem>,
    #[serde(default)]
    pub carbon_expenses: Vec<ExpenseItem>,
}

impl ExpenseInput {
    fn items(&self) -> impl Iterator<Item = &ExpenseItem> {
        self.fixed_expenses
            .iter()
            .chain(&self.variable_expenses)
            .chain(&self.water_disposal)
            .chain(&self.carbon_expenses)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpiKind {
    Expense,
    Revenue,
}

/// Net profit interest, given upstream as a mapping with exactly one key
/// (`expense` or `revenue`) to a monthly rate series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<NpiKind, Series>", into = "BTreeMap<NpiKind, Series>")]
pub struct NetProfitInterest {
    pub kind: NpiKind,
    pub rate: Series,
}

impl TryFrom<BTreeMap<NpiKind, Series>> for NetProfitInterest {
    type Error = String;

    fn try_from(map: BTreeMap<NpiKind, Series>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!("npi must have exactly one of expense/revenue, found {}", map.len()));
        }
        let (kind, rate) = map
            .into_iter()
            .next()
            .ok_or_else(|| "npi is empty".to_string())?;
        Ok(Self { kind, rate })
    }
}

impl From<NetProfitInterest> for BTreeMap<NpiKind, Series> {
    fn from(npi: NetProfitInterest) -> Self {
        [(npi.kind, npi.rate)].into_iter().collect()
    }
}

/// Before income tax cash flow input for one well or aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BfitInput {
    pub dates: DateContext,
    pub revenue: RevenueInput,
    #[serde(default)]
    pub expenses: ExpenseInput,
    pub total_production_tax: Series,
    pub total_capex: Series,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npi: Option<NetProfitInterest>,
}

/// Expense, production tax and capex aggregated outside this well's own inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupTotals {
    #[serde(default)]
    pub expense: Series,
    #[serde(default)]
    pub production_tax: Series,
    #[serde(default)]
    pub capex: Series,
}

/// Group-level BFIT: the group's own inputs plus totals rolled up from members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupBfitInput {
    #[serde(flatten)]
    pub group: BfitInput,
    #[serde(default)]
    pub members: Vec<GroupTotals>,
}

/// A case inside a group: its own inputs plus its allocated share of the
/// group-level totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupCaseBfitInput {
    #[serde(flatten)]
    pub case: BfitInput,
    pub group_share: GroupTotals,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BfitCashFlow {
    pub time: Vec<i64>,
    pub total_net_revenue: Series,
    pub total_gross_revenue: Series,
    pub expense: Series,
    pub production_tax: Series,
    pub capex: Series,
    /// Net revenue less expense and production tax
    pub net_income: Series,
    pub net_profit: Series,
    pub bfit_cf: Series,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BfitOutput {
    pub bfit_cf_dict: BfitCashFlow,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

pub fn before_income_tax_cash_flow(input: &BfitInput) -> EngineResult<ComputationOutput<BfitOutput>> {
    let start = Instant::now();
    let bfit = assemble_bfit(input, &[])?;
    Ok(wrap(input, bfit, start, "Before income tax cash flow"))
}

pub fn group_before_income_tax_cash_flow(
    input: &GroupBfitInput,
) -> EngineResult<ComputationOutput<BfitOutput>> {
    let start = Instant::now();
    let extra: Vec<&GroupTotals> = input.members.iter().collect();
    let bfit = assemble_bfit(&input.group, &extra)?;
    Ok(wrap(&input.group, bfit, start, "Group before income tax cash flow"))
}

pub fn group_case_before_income_tax_cash_flow(
    input: &GroupCaseBfitInput,
) -> EngineResult<ComputationOutput<BfitOutput>> {
    let start = Instant::now();
    let bfit = assemble_bfit(&input.case, &[&input.group_share])?;
    Ok(wrap(&input.case, bfit, start, "Group case before income tax cash flow"))
}

fn wrap(
    input: &BfitInput,
    bfit: BfitCashFlow,
    start: Instant,
    methodology: &str,
) -> ComputationOutput<BfitOutput> {
    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        methodology,
        &serde_json::json!({
            "npi": input.npi.as_ref().map(|n| n.kind),
            "phases": input.revenue.phases.keys().collect::<Vec<_>>(),
            "compositionals": input.revenue.compositionals.keys().collect::<Vec<_>>(),
        }),
        Vec::new(),
        elapsed,
        BfitOutput { bfit_cf_dict: bfit },
    )
}

/// Shared BFIT assembly. `extra` totals are added to the well's own expense,
/// production tax and capex before the net profit interest is applied.
pub fn assemble_bfit(input: &BfitInput, extra: &[&GroupTotals]) -> EngineResult<BfitCashFlow> {
    let axis = input.dates.time_axis()?;
    let len = axis.len();

    let revenues: Vec<(&String, &PhaseRevenue)> = input
        .revenue
        .phases
        .iter()
        .filter(|(key, _)| !AGGREGATE_REVENUE_KEYS.contains(&key.as_str()))
        .chain(input.revenue.compositionals.iter())
        .collect();
    for (name, rev) in &revenues {
        axis.check_len(&format!("{name}.net_revenue"), &rev.net_revenue)?;
        axis.check_len(&format!("{name}.gross_revenue"), &rev.gross_revenue)?;
    }
    let total_net_revenue = sum_series(len, revenues.iter().map(|(_, r)| r.net_revenue.as_slice()));
    let total_gross_revenue =
        sum_series(len, revenues.iter().map(|(_, r)| r.gross_revenue.as_slice()));

    for item in input.expenses.items() {
        axis.check_len("expense", &item.values)?;
    }
    axis.check_len("total_production_tax", &input.total_production_tax)?;
    axis.check_len("total_capex", &input.total_capex)?;
    for totals in extra {
        check_optional(&axis, "group expense", &totals.expense)?;
        check_optional(&axis, "group production_tax", &totals.production_tax)?;
        check_optional(&axis, "group capex", &totals.capex)?;
    }

    let expense = sum_series(
        len,
        input
            .expenses
            .items()
            .map(|e| e.values.as_slice())
            .chain(extra.iter().map(|t| t.expense.as_slice())),
    );
    let production_tax = sum_series(
        len,
        std::iter::once(input.total_production_tax.as_slice())
            .chain(extra.iter().map(|t| t.production_tax.as_slice())),
    );
    let capex = sum_series(
        len,
        std::iter::once(input.total_capex.as_slice()).chain(extra.iter().map(|t| t.capex.as_slice())),
    );

    let net_income = sub_series(&sub_series(&total_net_revenue, &expense), &production_tax);
    let (net_profit, bfit_cf) = apply_npi(&axis, &net_income, &capex, input.npi.as_ref())?;

    Ok(BfitCashFlow {
        time: axis.offsets().to_vec(),
        total_net_revenue,
        total_gross_revenue,
        expense,
        production_tax,
        capex,
        net_income,
        net_profit,
        bfit_cf,
    })
}

/// (net_profit, bfit_cf) for the given net profit interest.
///
/// An expense NPI pays away a share of positive net income and the holder
/// keeps the rest less capex. A revenue NPI holder receives only that share
/// and bears no capex.
fn apply_npi(
    axis: &TimeAxis,
    net_income: &[Money],
    capex: &[Money],
    npi: Option<&NetProfitInterest>,
) -> EngineResult<(Series, Series)> {
    let before_npi = sub_series(net_income, capex);
    let Some(npi) = npi else {
        return Ok((axis.zeros(), before_npi));
    };
    axis.check_len("npi", &npi.rate)?;

    let share = |rate: &Rate, np: &Money| {
        if *np > Decimal::ZERO {
            rate * np
        } else {
            Decimal::ZERO
        }
    };
    match npi.kind {
        NpiKind::Expense => {
            let net_profit: Series = npi
                .rate
                .iter()
                .zip(net_income)
                .map(|(rate, np)| -share(rate, np))
                .collect();
            let bfit_cf = before_npi
                .iter()
                .zip(&net_profit)
                .map(|(cf, profit)| cf + profit)
                .collect();
            Ok((net_profit, bfit_cf))
        }
        NpiKind::Revenue => {
            let net_profit: Series = npi
                .rate
                .iter()
                .zip(net_income)
                .map(|(rate, np)| share(rate, np))
                .collect();
            Ok((net_profit.clone(), net_profit))
        }
    }
}

fn check_optional(axis: &TimeAxis, name: &str, series: &[Money]) -> EngineResult<()> {
    if series.is_empty() {
        Ok(())
    } else {
        axis.check_len(name, series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn dates() -> DateContext {
        let d = |m| NaiveDate::from_ymd_opt(2021, m, 1).unwrap();
        DateContext {
            as_of_date: d(1),
            cf_start_date: d(1),
            cf_end_date: d(2),
            first_production_date: None,
        }
    }

    fn revenue(net: [i64; 2], gross: [i64; 2]) -> PhaseRevenue {
        PhaseRevenue {
            net_revenue: net.iter().map(|v| Decimal::from(*v)).collect(),
            gross_revenue: gross.iter().map(|v| Decimal::from(*v)).collect(),
        }
    }

    fn base_input() -> BfitInput {
        BfitInput {
            dates: dates(),
            revenue: RevenueInput {
                phases: [
                    ("oil".to_string(), revenue([800, 400], [1000, 500])),
                    ("gas".to_string(), revenue([150, 50], [200, 100])),
                ]
                .into_iter()
                .collect(),
                compositionals: [("ethane".to_string(), revenue([50, 50], [60, 60]))]
                    .into_iter()
                    .collect(),
            },
            expenses: ExpenseInput {
                fixed_expenses: vec![ExpenseItem { values: vec![dec!(100), dec!(100)] }],
                variable_expenses: vec![ExpenseItem { values: vec![dec!(50), dec!(25)] }],
                water_disposal: vec![ExpenseItem { values: vec![dec!(30), dec!(30)] }],
                carbon_expenses: vec![ExpenseItem { values: vec![dec!(20), dec!(20)] }],
            },
            total_production_tax: vec![dec!(50), dec!(25)],
            total_capex: vec![dec!(1000), dec!(0)],
            npi: None,
        }
    }

    #[test]
    fn test_totals_and_net_income() {
        let out = before_income_tax_cash_flow(&base_input()).unwrap();
        let b = &out.result.bfit_cf_dict;
        assert_eq!(b.time, vec![0, 1]);
        assert_eq!(b.total_net_revenue, vec![dec!(1000), dec!(500)]);
        assert_eq!(b.total_gross_revenue, vec![dec!(1260), dec!(660)]);
        assert_eq!(b.expense, vec![dec!(200), dec!(175)]);
        assert_eq!(b.net_income, vec![dec!(750), dec!(300)]);
        assert_eq!(b.bfit_cf, vec![dec!(-250), dec!(300)]);
        assert_eq!(b.net_profit, vec![dec!(0), dec!(0)]);
    }

    #[test]
    fn test_aggregate_keys_are_skipped() {
        let mut input = base_input();
        input
            .revenue
            .phases
            .insert("time".to_string(), revenue([9999, 9999], [9999, 9999]));
        let out = before_income_tax_cash_flow(&input).unwrap();
        assert_eq!(out.result.bfit_cf_dict.total_net_revenue, vec![dec!(1000), dec!(500)]);
    }

    #[test]
    fn test_expense_npi() {
        let mut input = base_input();
        input.npi = Some(NetProfitInterest {
            kind: NpiKind::Expense,
            rate: vec![dec!(0.1), dec!(0.1)],
        });
        let b = before_income_tax_cash_flow(&input).unwrap().result.bfit_cf_dict;
        assert_eq!(b.net_profit, vec![dec!(-75), dec!(-30)]);
        assert_eq!(b.bfit_cf, vec![dec!(-325), dec!(270)]);
    }

    #[test]
    fn test_revenue_npi_excludes_capex() {
        let mut input = base_input();
        input.total_production_tax = vec![dec!(50), dec!(500)];
        input.npi = Some(NetProfitInterest {
            kind: NpiKind::Revenue,
            rate: vec![dec!(0.2), dec!(0.2)],
        });
        let b = before_income_tax_cash_flow(&input).unwrap().result.bfit_cf_dict;
        // Month 1 net income is negative, so the holder receives nothing.
        assert_eq!(b.net_profit, vec![dec!(150), dec!(0)]);
        assert_eq!(b.bfit_cf, b.net_profit);
    }

    #[test]
    fn test_npi_parses_single_key_only() {
        let npi: NetProfitInterest = serde_json::from_str(r#"{"expense": ["0.1", "0.2"]}"#).unwrap();
        assert_eq!(npi.kind, NpiKind::Expense);
        assert!(serde_json::from_str::<NetProfitInterest>(
            r#"{"expense": ["0.1"], "revenue": ["0.1"]}"#
        )
        .is_err());
    }

    #[test]
    fn test_group_variants_add_external_totals() {
        let totals = GroupTotals {
            expense: vec![dec!(10), dec!(10)],
            production_tax: vec![dec!(5), dec!(5)],
            capex: vec![],
        };
        let group = GroupBfitInput {
            group: base_input(),
            members: vec![totals.clone(), totals.clone()],
        };
        let g = group_before_income_tax_cash_flow(&group).unwrap().result.bfit_cf_dict;
        assert_eq!(g.expense, vec![dec!(220), dec!(195)]);
        assert_eq!(g.production_tax, vec![dec!(60), dec!(35)]);
        assert_eq!(g.bfit_cf, vec![dec!(-280), dec!(270)]);

        let case = GroupCaseBfitInput {
            case: base_input(),
            group_share: GroupTotals {
                capex: vec![dec!(100), dec!(0)],
                ..totals
            },
        };
        let c = group_case_before_income_tax_cash_flow(&case).unwrap().result.bfit_cf_dict;
        assert_eq!(c.capex, vec![dec!(1100), dec!(0)]);
        assert_eq!(c.bfit_cf, vec![dec!(-365), dec!(285)]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut input = base_input();
        input.total_capex = vec![dec!(1)];
        assert!(matches!(
            before_income_tax_cash_flow(&input),
            Err(EngineError::LengthMismatch { .. })
        ));
    }
}
