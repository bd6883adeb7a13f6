use axum::{body::Bytes, extract::State, Json};
use chrono::Local;
use insights_core::Report;
use tracing::info;

use crate::api::{GenerateReportRequest, HomeResponse};
use crate::error::ApiError;
use crate::AppState;

/// e.g. "Monday, October 21, 2024 01:38 PM"
const CURRENT_TIME_FORMAT: &str = "%A, %B %d, %Y %I:%M %p";

pub async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Server is working".to_string(),
        current_time: Local::now().format(CURRENT_TIME_FORMAT).to_string(),
    })
}

// Raw bytes so a malformed body still gets the JSON 400 instead of axum's rejection.
pub async fn generate_report(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Report>, ApiError> {
    let transcript = GenerateReportRequest::transcript_from_body(&body)?;
    info!("Generating report for a {} byte transcript", transcript.len());

    let report = state.pipeline.run(&transcript).await?;

    info!("Report ready");
    Ok(Json(report))
}
