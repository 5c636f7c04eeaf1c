use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use loan_scenario_core::evaluator::{self, LoanConfiguration};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Single loan
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_loan(input_json: String) -> NapiResult<String> {
    let input: LoanConfiguration = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = evaluator::analyze_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let input: LoanConfiguration = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let loan = evaluator::evaluate(&input).map_err(to_napi_error)?;
    let output = loan_scenario_core::schedule::build_schedule(&loan).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_loans(input_json: String) -> NapiResult<String> {
    let input: loan_scenario_core::comparison::ComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_scenario_core::comparison::compare_configurations(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_scenario_set(input_json: String) -> NapiResult<String> {
    let input: loan_scenario_core::scenario_set::ScenarioSetInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_scenario_core::scenario_set::analyze_scenario_set(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Sensitivity & guidance
// ---------------------------------------------------------------------------

#[napi]
pub fn loan_sensitivity(input_json: String) -> NapiResult<String> {
    let input: loan_scenario_core::sensitivity::LoanSensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        loan_scenario_core::sensitivity::loan_sensitivity(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct GuidanceRequest {
    price: Decimal,
    #[serde(default)]
    loan: Option<LoanConfiguration>,
}

/// `{"price": ..., "loan": <optional loan configuration>}`
#[napi]
pub fn loan_guidance(input_json: String) -> NapiResult<String> {
    let request: GuidanceRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let loan = request
        .loan
        .as_ref()
        .map(evaluator::evaluate)
        .transpose()
        .map_err(to_napi_error)?;
    let output = loan_scenario_core::guidance::assess(request.price, loan.as_ref())
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
