use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Data source error: {0}")]
    Database(#[from] database::DbError),
    #[error("Analytics error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] core_types::CoreError),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Data source error.");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "The market data source is unavailable".to_string(),
                )
            }
            AppError::Analytics(analytics_err) => {
                tracing::error!(error = ?analytics_err, "Analytics error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while computing the dashboard".to_string(),
                )
            }
            AppError::InvalidRequest(core_err) => {
                (StatusCode::BAD_REQUEST, core_err.to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
