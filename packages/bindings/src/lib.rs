use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

/// Inputs for schedule generation: the mortgage terms plus the positioning
/// date the host binds to "today".
#[derive(serde::Deserialize)]
struct ScheduleRequest {
    terms: propfin_core::types::MortgageTerms,
    as_of: chrono::NaiveDate,
}

#[napi]
pub fn build_amortization_schedule(input_json: String) -> NapiResult<String> {
    let request: ScheduleRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let schedule =
        propfin_core::mortgage::schedule::build_schedule(&request.terms, request.as_of)
            .map_err(to_napi_error)?;
    serde_json::to_string(&schedule).map_err(to_napi_error)
}

#[napi]
pub fn parse_payment_history(csv_text: String) -> NapiResult<String> {
    let output = propfin_core::mortgage::statement::parse_payment_history(&csv_text)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Investment analytics
// ---------------------------------------------------------------------------

#[napi]
pub fn investment_metrics(input_json: String) -> NapiResult<String> {
    let input: propfin_core::investment::metrics::InvestmentMetricsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = propfin_core::investment::metrics::analyze_investment(&input, None)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_irr(input_json: String) -> NapiResult<String> {
    let input: propfin_core::investment::irr::IrrProjectionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        propfin_core::investment::irr::project_irr(&input, None).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Land transfer tax
// ---------------------------------------------------------------------------

#[napi]
pub fn land_transfer_tax(input_json: String) -> NapiResult<String> {
    let input: propfin_core::transfer_tax::LttInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = propfin_core::transfer_tax::calculate_ltt(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
