use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use well_cashflow_core::cash_flow::{self, NpiKind};
use well_cashflow_core::dda;
use well_cashflow_core::income_tax;

fn series(value: &str, months: usize) -> Value {
    json!(vec![value; months])
}

fn dates(as_of: &str, end: &str) -> Value {
    json!({
        "as_of_date": as_of,
        "cf_start_date": as_of,
        "cf_end_date": end,
    })
}

/// One year of a flat-producing oil well with a single 1200 facility outlay.
fn flat_well() -> Value {
    let mut capex = vec!["0"; 12];
    capex[0] = "1200";
    json!({
        "dates": dates("2022-01-01", "2022-12-01"),
        "revenue": {
            "phases": {
                "oil": {"net_revenue": series("1000", 12), "gross_revenue": series("1250", 12)}
            }
        },
        "expenses": {
            "fixed_expenses": [{"values": series("200", 12)}]
        },
        "total_production_tax": series("50", 12),
        "total_capex": capex,
        "all_capex": [{
            "name": "facilities",
            "time": 0,
            "tangible": "1200",
            "calculation": "gross",
            "depreciation_model": {
                "depreciation_or_depletion": "depreciation",
                "tangible_factors": ["100"]
            }
        }],
        "working_interest": series("1", 12),
        "income_tax": {
            "carry_forward": "yes",
            "state_income_tax": {"type": "flat", "rate": "0.05"},
            "federal_income_tax": {"type": "flat", "rate": "0.21"}
        }
    })
}

// ===========================================================================
// Well-level run
// ===========================================================================

#[test]
fn test_flat_well_end_to_end() {
    let input: cash_flow::WellCashFlowInput = serde_json::from_value(flat_well()).unwrap();
    let out = cash_flow::calculate_well_cash_flow(&input).unwrap().result;

    let bfit = &out.bfit_cf_dict;
    // 1000 revenue - 200 expense - 50 production tax
    assert_eq!(bfit.net_income, vec![dec!(750); 12]);
    assert_eq!(bfit.bfit_cf[0], dec!(-450));
    assert_eq!(bfit.bfit_cf[1], dec!(750));

    let afit = &out.afit_cf_dict;
    assert_eq!(afit.dda.columns.depreciation, vec![dec!(100); 12]);
    // Capex added back, depreciation taken off: 750 + 0 - 100 every month.
    assert_eq!(afit.taxable_income, vec![dec!(650); 12]);
    assert_eq!(afit.state_income_tax[5], dec!(32.5));
    assert_eq!(afit.federal_income_tax[5], dec!(129.675));
    assert_eq!(afit.afit_cf[5], dec!(587.825));
    assert_eq!(afit.afit_cf[0], dec!(-450) - dec!(32.5) - dec!(129.675));
}

#[test]
fn test_afit_never_exceeds_bfit_when_income_is_taxed() {
    let input: cash_flow::WellCashFlowInput = serde_json::from_value(flat_well()).unwrap();
    let out = cash_flow::calculate_well_cash_flow(&input).unwrap().result;
    for (afit, bfit) in out.afit_cf_dict.afit_cf.iter().zip(&out.bfit_cf_dict.bfit_cf) {
        assert!(afit < bfit);
    }
}

#[test]
fn test_revenue_npi_from_json_bypasses_tax() {
    let mut well = flat_well();
    well["npi"] = json!({"revenue": series("0.1", 12)});
    let input: cash_flow::WellCashFlowInput = serde_json::from_value(well).unwrap();
    assert_eq!(input.bfit.npi.as_ref().map(|n| n.kind), Some(NpiKind::Revenue));

    let out = cash_flow::calculate_well_cash_flow(&input).unwrap().result;
    // The holder receives 10% of positive net income and bears no capex.
    assert_eq!(out.bfit_cf_dict.bfit_cf, vec![dec!(75); 12]);
    assert_eq!(out.afit_cf_dict.afit_cf, out.bfit_cf_dict.bfit_cf);
    assert!(out.afit_cf_dict.dda.total_deductions.iter().all(|d| d.is_zero()));
}

#[test]
fn test_npi_with_two_kinds_is_rejected() {
    let mut well = flat_well();
    well["npi"] = json!({"revenue": series("0.1", 12), "expense": series("0.1", 12)});
    assert!(serde_json::from_value::<cash_flow::WellCashFlowInput>(well).is_err());
}

#[test]
fn test_standalone_afit_accepts_bfit_output() {
    let well: cash_flow::WellCashFlowInput = serde_json::from_value(flat_well()).unwrap();
    let bfit = cash_flow::before_income_tax_cash_flow(&well.bfit).unwrap().result;

    let afit_json = json!({
        "dates": dates("2022-01-01", "2022-12-01"),
        "bfit_cf_dict": serde_json::to_value(&bfit.bfit_cf_dict).unwrap(),
        "all_capex": flat_well()["all_capex"].clone(),
        "working_interest": series("1", 12),
        "income_tax": flat_well()["income_tax"].clone(),
    });
    let afit_input: cash_flow::AfitInput = serde_json::from_value(afit_json).unwrap();
    let afit = cash_flow::after_income_tax_cash_flow(&afit_input).unwrap().result;
    assert_eq!(afit.afit_cf_dict.taxable_income, vec![dec!(650); 12]);
}

// ===========================================================================
// Group variants
// ===========================================================================

#[test]
fn test_group_case_adds_allocated_share() {
    let mut case = flat_well();
    case["group_share"] = json!({"expense": series("100", 12), "capex": series("0", 12)});
    let input: cash_flow::GroupCaseBfitInput = serde_json::from_value(case).unwrap();
    let out = cash_flow::group_case_before_income_tax_cash_flow(&input)
        .unwrap()
        .result;
    assert_eq!(out.bfit_cf_dict.expense, vec![dec!(300); 12]);
    assert_eq!(out.bfit_cf_dict.production_tax, vec![dec!(50); 12]);
    assert_eq!(out.bfit_cf_dict.bfit_cf[11], dec!(650));
}

#[test]
fn test_group_rolls_up_members() {
    let mut group = flat_well();
    group["members"] = json!([
        {"production_tax": series("10", 12)},
        {"production_tax": series("15", 12), "capex": series("5", 12)},
    ]);
    let input: cash_flow::GroupBfitInput = serde_json::from_value(group).unwrap();
    let out = cash_flow::group_before_income_tax_cash_flow(&input).unwrap().result;
    assert_eq!(out.bfit_cf_dict.production_tax, vec![dec!(75); 12]);
    assert_eq!(out.bfit_cf_dict.capex[0], dec!(1205));
    assert_eq!(out.bfit_cf_dict.bfit_cf[1], dec!(1000) - dec!(200) - dec!(75) - dec!(5));
}

// ===========================================================================
// Standalone DD&A and taxable income
// ===========================================================================

#[test]
fn test_dda_ecl_depletion_with_statutory_floor() {
    let input: dda::DdaInput = serde_json::from_value(json!({
        "dates": dates("2021-01-01", "2021-06-01"),
        "capex": [{
            "time": 0,
            "intangible": "600",
            "calculation": "net",
            "depreciation_model": {
                "depreciation_or_depletion": "depletion",
                "tangible_method": "never",
                "intangible_method": "ecl"
            }
        }],
        "working_interest": series("1", 6),
        "net_revenue": series("100", 6),
        "gross_revenue": series("400", 6),
        "fifteen_depletion": "yes"
    }))
    .unwrap();

    let out = dda::calculate_dda(&input).unwrap();
    let r = &out.result;
    assert_eq!(r.columns.intangible_depletion[5], dec!(600));
    assert_eq!(r.percentage_depletion, vec![dec!(60); 6]);
    assert_eq!(r.total_deductions[0], dec!(60));
    assert_eq!(r.total_deductions[5], dec!(600));
    assert!(out.warnings.is_empty());
}

#[test]
fn test_dda_missing_reserves_warns() {
    let input: dda::DdaInput = serde_json::from_value(json!({
        "dates": dates("2021-01-01", "2021-03-01"),
        "capex": [{
            "name": "drilling",
            "time": 0,
            "intangible": "300",
            "calculation": "net",
            "depreciation_model": {
                "depreciation_or_depletion": "depletion",
                "tangible_method": "never",
                "intangible_method": "unit_of_production_BOE"
            }
        }],
        "working_interest": series("1", 3),
        "net_revenue": series("0", 3),
        "gross_revenue": series("0", 3)
    }))
    .unwrap();

    let out = dda::calculate_dda(&input).unwrap();
    assert!(!out.warnings.is_empty());
    assert!(out.warnings.iter().any(|w| w.contains("drilling")));
}

#[test]
fn test_dda_rejects_unknown_calculation() {
    let input: dda::DdaInput = serde_json::from_value(json!({
        "dates": dates("2021-01-01", "2021-03-01"),
        "capex": [{
            "time": 0,
            "tangible": "10",
            "calculation": "partial",
            "depreciation_model": {
                "depreciation_or_depletion": "depreciation",
                "tangible_factors": ["100"]
            }
        }],
        "working_interest": series("1", 3),
        "net_revenue": series("0", 3),
        "gross_revenue": series("0", 3)
    }))
    .unwrap();

    let err = dda::calculate_dda(&input).unwrap_err();
    assert!(err.to_string().contains("partial"));
}

#[test]
fn test_taxable_income_pre_tcja_loss_fully_offsets() {
    let input: income_tax::TaxableIncomeInput = serde_json::from_value(json!({
        "dates": dates("2015-01-01", "2015-03-01"),
        "bfit_cf": ["-500", "300", "300"],
        "capex": series("0", 3),
        "total_deductions": series("0", 3),
        "carry_forward": "yes"
    }))
    .unwrap();
    let out = income_tax::calculate_taxable_income(&input).unwrap().result;
    assert_eq!(out.taxable_income, vec![dec!(0), dec!(0), dec!(100)]);
    assert_eq!(out.loss_carry_forward, vec![dec!(500), dec!(200), Decimal::ZERO]);
}
