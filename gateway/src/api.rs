use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

// Input: what the client posts to /api/generate_report
#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    #[serde(default)]
    pub transcript: Value, // Anything but a non-empty string is rejected
}

impl GenerateReportRequest {
    /// Pull a usable transcript out of a raw request body.
    pub fn transcript_from_body(body: &[u8]) -> Result<String, ApiError> {
        // Parse as a generic value first so arrays and scalars are rejected too.
        let payload: Value = serde_json::from_slice(body).map_err(|_| ApiError::MissingTranscript)?;
        if !payload.is_object() {
            return Err(ApiError::MissingTranscript);
        }
        let request: Self =
            serde_json::from_value(payload).map_err(|_| ApiError::MissingTranscript)?;

        match request.transcript {
            // Whitespace is passed through untouched.
            Value::String(text) if !text.is_empty() => Ok(text),
            _ => Err(ApiError::MissingTranscript),
        }
    }
}

// Output: GET /
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub message: String,
    pub current_time: String,
}

// Output: any failure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
