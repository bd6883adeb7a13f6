use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use insights_core::CoreError;
use thiserror::Error;
use tracing::{error, warn};

use crate::api::ErrorResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Transcript is required")]
    MissingTranscript,

    /// Template, provider and schema failures all collapse into a 500.
    #[error(transparent)]
    Pipeline(#[from] CoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingTranscript => {
                warn!("Rejected report request without a transcript");
                StatusCode::BAD_REQUEST
            }
            ApiError::Pipeline(err) => {
                error!(kind = err.kind(), "Report generation failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
