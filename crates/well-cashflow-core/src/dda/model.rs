use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::time_axis::{add_series, add_months, first_of_month, TimeAxis};
use crate::types::{Money, Phase, Rate, Series, Volume, YesNo};
use crate::EngineResult;

// ---------------------------------------------------------------------------
// Capital investment
// ---------------------------------------------------------------------------

/// Whether capex amounts are stated at 100% (gross) or already net to the
/// working interest.
///
/// Unrecognised strings are kept so the engine can report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Calculation {
    Gross,
    Net,
    Other(String),
}

impl From<String> for Calculation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "gross" => Calculation::Gross,
            "net" => Calculation::Net,
            _ => Calculation::Other(value),
        }
    }
}

impl From<Calculation> for String {
    fn from(value: Calculation) -> Self {
        match value {
            Calculation::Gross => "gross".to_string(),
            Calculation::Net => "net".to_string(),
            Calculation::Other(v) => v,
        }
    }
}

/// A single capital outlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalInvestment {
    /// Optional label used in logs and warnings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Month offset of the outlay relative to the as-of month
    pub time: i64,
    #[serde(default)]
    pub tangible: Money,
    #[serde(default)]
    pub intangible: Money,
    pub calculation: Calculation,
    /// Deal-terms multiplier; blank means 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_terms: Option<Decimal>,
    #[serde(default)]
    pub depreciation_model: DepreciationModelSpec,
}

impl CapitalInvestment {
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("capex@{}", self.time))
    }

    pub fn deal_terms_multiplier(&self) -> Decimal {
        self.deal_terms.unwrap_or(Decimal::ONE)
    }

    /// Working interest applied to this outlay.
    ///
    /// Gross amounts take the working interest at the investment month,
    /// clamped to the first/last axis month; net amounts use 1.
    pub fn working_interest(&self, working_interest: &[Rate], axis: &TimeAxis) -> EngineResult<Rate> {
        match &self.calculation {
            Calculation::Net => Ok(Decimal::ONE),
            Calculation::Gross => {
                axis.check_len("working_interest", working_interest)?;
                Ok(working_interest[axis.clamped_index(self.time)])
            }
            Calculation::Other(value) => Err(EngineError::Configuration {
                field: "calculation".into(),
                value: value.clone(),
            }),
        }
    }

    /// (tangible, intangible) after deal terms and working interest.
    pub fn scaled_amounts(&self, ctx: &AllocationContext<'_>) -> EngineResult<(Money, Money)> {
        let multiplier = self.deal_terms_multiplier() * self.working_interest(ctx.working_interest, ctx.axis)?;
        Ok((self.tangible * multiplier, self.intangible * multiplier))
    }

    /// Calendar month in which the outlay happens.
    pub fn date(&self, as_of_date: NaiveDate) -> EngineResult<NaiveDate> {
        add_months(first_of_month(as_of_date), self.time)
    }
}

// ---------------------------------------------------------------------------
// Depreciation / depletion model
// ---------------------------------------------------------------------------

/// `"none"` or a depreciation/depletion model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawModelSpec", into = "RawModelSpec")]
pub enum DepreciationModelSpec {
    #[default]
    None,
    Model(AllocationModel),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawModelSpec {
    Keyword(String),
    Model(AllocationModel),
}

impl TryFrom<RawModelSpec> for DepreciationModelSpec {
    type Error = String;

    fn try_from(raw: RawModelSpec) -> Result<Self, Self::Error> {
        match raw {
            RawModelSpec::Keyword(k) if k == "none" => Ok(DepreciationModelSpec::None),
            RawModelSpec::Keyword(k) => Err(format!("unknown depreciation model '{k}'")),
            RawModelSpec::Model(m) => Ok(DepreciationModelSpec::Model(m)),
        }
    }
}

impl From<DepreciationModelSpec> for RawModelSpec {
    fn from(spec: DepreciationModelSpec) -> Self {
        match spec {
            DepreciationModelSpec::None => RawModelSpec::Keyword("none".into()),
            DepreciationModelSpec::Model(m) => RawModelSpec::Model(m),
        }
    }
}

/// Allocation model, resolved once when the investment is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "depreciation_or_depletion", rename_all = "snake_case")]
pub enum AllocationModel {
    Depreciation(DepreciationParams),
    Depletion(DepletionParams),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepreciationParams {
    /// Yearly tangible factors in percent (e.g. MACRS 7-year: 14.29, 24.49, ...)
    #[serde(default)]
    pub tangible_factors: Vec<Decimal>,
    /// Yearly intangible factors in percent
    #[serde(default)]
    pub intangible_factors: Vec<Decimal>,
    /// Apply the statutory bonus-depreciation schedule
    #[serde(default)]
    pub tcja_bonus: YesNo,
    /// Extra bonus percentage added on top of the statutory schedule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_depreciation_pct: Option<Decimal>,
    /// Tax credit as a percentage of the tangible amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_credit_pct: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepletionParams {
    pub tangible_method: DepletionMethod,
    pub intangible_method: DepletionMethod,
    /// Percent of tangible cost recognised in the investment month
    #[serde(default)]
    pub tangible_immediate_pct: Decimal,
    /// Percent of intangible cost recognised in the investment month
    #[serde(default)]
    pub intangible_immediate_pct: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepletionMethod {
    #[serde(rename = "unit_of_production_major")]
    UnitOfProductionMajor,
    #[serde(rename = "unit_of_production_BOE", alias = "unit_of_production_boe")]
    UnitOfProductionBoe,
    #[serde(rename = "ecl")]
    Ecl,
    #[serde(rename = "never")]
    Never,
    #[serde(rename = "fpd")]
    Fpd,
}

// ---------------------------------------------------------------------------
// Allocation context
// ---------------------------------------------------------------------------

/// Production volumes used by unit-of-production depletion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepletionVolumes {
    /// Phase the "major" method follows
    #[serde(default)]
    pub primary_product: Phase,
    /// Wellhead production per axis month
    #[serde(default)]
    pub wellhead: BTreeMap<Phase, Series>,
    /// Wellhead volume before economic-limit truncation, starting at the
    /// first axis month; may run past the axis end
    #[serde(default)]
    pub unadjusted_wellhead: BTreeMap<Phase, Vec<Volume>>,
}

/// Read-only inputs shared by every allocator call.
#[derive(Debug, Clone, Copy)]
pub struct AllocationContext<'a> {
    pub axis: &'a TimeAxis,
    pub as_of_date: NaiveDate,
    pub first_production_date: Option<NaiveDate>,
    pub working_interest: &'a [Rate],
    pub volumes: &'a DepletionVolumes,
}

// ---------------------------------------------------------------------------
// Allocation result
// ---------------------------------------------------------------------------

/// DD&A columns produced by one or more investments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdaColumns {
    pub depreciation: Series,
    pub tangible_depreciation: Series,
    pub intangible_depreciation: Series,
    pub depletion: Series,
    pub tangible_depletion: Series,
    pub intangible_depletion: Series,
    pub tax_credit: Series,
}

impl DdaColumns {
    pub fn zeros(len: usize) -> Self {
        let z = vec![Decimal::ZERO; len];
        Self {
            depreciation: z.clone(),
            tangible_depreciation: z.clone(),
            intangible_depreciation: z.clone(),
            depletion: z.clone(),
            tangible_depletion: z.clone(),
            intangible_depletion: z.clone(),
            tax_credit: z,
        }
    }

    /// Elementwise sum of two results over the same axis.
    pub fn merge(self, other: &DdaColumns) -> Self {
        Self {
            depreciation: add_series(&self.depreciation, &other.depreciation),
            tangible_depreciation: add_series(&self.tangible_depreciation, &other.tangible_depreciation),
            intangible_depreciation: add_series(
                &self.intangible_depreciation,
                &other.intangible_depreciation,
            ),
            depletion: add_series(&self.depletion, &other.depletion),
            tangible_depletion: add_series(&self.tangible_depletion, &other.tangible_depletion),
            intangible_depletion: add_series(&self.intangible_depletion, &other.intangible_depletion),
            tax_credit: add_series(&self.tax_credit, &other.tax_credit),
        }
    }

    /// Depreciation plus depletion
    pub fn total(&self) -> Series {
        add_series(&self.depreciation, &self.depletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_none_model() {
        let inv: CapitalInvestment = serde_json::from_str(
            r#"{"time": 0, "tangible": "100", "calculation": "net", "depreciation_model": "none"}"#,
        )
        .unwrap();
        assert_eq!(inv.depreciation_model, DepreciationModelSpec::None);
        assert_eq!(inv.intangible, Decimal::ZERO);
    }

    #[test]
    fn test_parse_depreciation_model() {
        let inv: CapitalInvestment = serde_json::from_str(
            r#"{
                "time": 3,
                "tangible": "1000",
                "intangible": "500",
                "calculation": "gross",
                "deal_terms": "0.5",
                "depreciation_model": {
                    "depreciation_or_depletion": "depreciation",
                    "tangible_factors": ["50", "50"],
                    "tcja_bonus": "yes",
                    "tax_credit_pct": "10"
                }
            }"#,
        )
        .unwrap();
        match &inv.depreciation_model {
            DepreciationModelSpec::Model(AllocationModel::Depreciation(p)) => {
                assert_eq!(p.tangible_factors, vec![dec!(50), dec!(50)]);
                assert!(p.tcja_bonus.is_yes());
                assert_eq!(p.tax_credit_pct, Some(dec!(10)));
            }
            other => panic!("unexpected model {other:?}"),
        }
        assert_eq!(inv.deal_terms_multiplier(), dec!(0.5));
    }

    #[test]
    fn test_parse_depletion_model() {
        let spec: DepreciationModelSpec = serde_json::from_str(
            r#"{
                "depreciation_or_depletion": "depletion",
                "tangible_method": "unit_of_production_BOE",
                "intangible_method": "ecl",
                "intangible_immediate_pct": "70"
            }"#,
        )
        .unwrap();
        match spec {
            DepreciationModelSpec::Model(AllocationModel::Depletion(p)) => {
                assert_eq!(p.tangible_method, DepletionMethod::UnitOfProductionBoe);
                assert_eq!(p.intangible_method, DepletionMethod::Ecl);
                assert_eq!(p.intangible_immediate_pct, dec!(70));
            }
            other => panic!("unexpected model {other:?}"),
        }
    }

    #[test]
    fn test_unknown_calculation_is_kept() {
        let inv: CapitalInvestment =
            serde_json::from_str(r#"{"time": 0, "calculation": "partial"}"#).unwrap();
        assert_eq!(inv.calculation, Calculation::Other("partial".into()));

        let axis = TimeAxis::new(0, 2).unwrap();
        let err = inv.working_interest(&[dec!(1); 3], &axis).unwrap_err();
        assert!(matches!(err, EngineError::Configuration { ref value, .. } if value == "partial"));
    }

    #[test]
    fn test_gross_working_interest_clamps_to_axis() {
        let axis = TimeAxis::new(0, 2).unwrap();
        let wi = vec![dec!(0.5), dec!(0.6), dec!(0.7)];
        let mut inv: CapitalInvestment =
            serde_json::from_str(r#"{"time": -4, "calculation": "gross"}"#).unwrap();
        assert_eq!(inv.working_interest(&wi, &axis).unwrap(), dec!(0.5));
        inv.time = 40;
        assert_eq!(inv.working_interest(&wi, &axis).unwrap(), dec!(0.7));
        inv.calculation = Calculation::Net;
        assert_eq!(inv.working_interest(&wi, &axis).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_merge_is_elementwise() {
        let mut a = DdaColumns::zeros(2);
        a.depreciation = vec![dec!(1), dec!(2)];
        let mut b = DdaColumns::zeros(2);
        b.depreciation = vec![dec!(3), dec!(4)];
        b.depletion = vec![dec!(1), dec!(1)];
        let merged = a.merge(&b);
        assert_eq!(merged.depreciation, vec![dec!(4), dec!(6)]);
        assert_eq!(merged.total(), vec![dec!(5), dec!(7)]);
    }
}
