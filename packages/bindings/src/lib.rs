use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use well_cashflow_core::{cash_flow, dda, income_tax, EngineResult};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse a JSON input, run `f` on it and return the JSON output.
fn run_json<I, O>(input_json: &str, f: impl FnOnce(&I) -> EngineResult<O>) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = f(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Cash flow
// ---------------------------------------------------------------------------

#[napi]
pub fn before_income_tax_cash_flow(input_json: String) -> NapiResult<String> {
    run_json::<cash_flow::BfitInput, _>(&input_json, cash_flow::before_income_tax_cash_flow)
}

#[napi]
pub fn group_before_income_tax_cash_flow(input_json: String) -> NapiResult<String> {
    run_json::<cash_flow::GroupBfitInput, _>(
        &input_json,
        cash_flow::group_before_income_tax_cash_flow,
    )
}

#[napi]
pub fn group_case_before_income_tax_cash_flow(input_json: String) -> NapiResult<String> {
    run_json::<cash_flow::GroupCaseBfitInput, _>(
        &input_json,
        cash_flow::group_case_before_income_tax_cash_flow,
    )
}

#[napi]
pub fn after_income_tax_cash_flow(input_json: String) -> NapiResult<String> {
    run_json::<cash_flow::AfitInput, _>(&input_json, cash_flow::after_income_tax_cash_flow)
}

#[napi]
pub fn well_cash_flow(input_json: String) -> NapiResult<String> {
    run_json::<cash_flow::WellCashFlowInput, _>(&input_json, cash_flow::calculate_well_cash_flow)
}

// ---------------------------------------------------------------------------
// DD&A and taxable income
// ---------------------------------------------------------------------------

#[napi]
pub fn dda_schedule(input_json: String) -> NapiResult<String> {
    run_json::<dda::DdaInput, _>(&input_json, dda::calculate_dda)
}

#[napi]
pub fn taxable_income(input_json: String) -> NapiResult<String> {
    run_json::<income_tax::TaxableIncomeInput, _>(&input_json, income_tax::calculate_taxable_income)
}
