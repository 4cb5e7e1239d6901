//! Error responses for HTTP handlers.
//!
//! Handlers return `Result<Json<T>, ApiError>`. Render and summary failures never
//! get here (the orchestrator degrades them into records), so what remains is a
//! store or transport failure: logged server-side, answered with a static 500.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pageinsights_shared::PageInsightsError;

#[derive(Debug)]
pub enum ApiError {
    /// 500 Internal Server Error. Details are logged, not exposed.
    Internal(PageInsightsError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };
        let body = serde_json::json!({"error": message});
        (status, Json(body)).into_response()
    }
}

impl From<PageInsightsError> for ApiError {
    fn from(err: PageInsightsError) -> Self {
        Self::Internal(err)
    }
}
