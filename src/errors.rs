use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Message returned whenever no summary has been computed yet.
pub const NO_DATA_MESSAGE: &str = "No data available";

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// The request body could not be processed (wrong JSON shape, malformed rows).
    BadRequest(String),
    /// No summary has been computed yet.
    NoData,
    /// Chart rendering or PNG encoding failed.
    ChartError(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "{}", msg),
            AppError::NoData => write!(f, "{}", NO_DATA_MESSAGE),
            AppError::ChartError(msg) => write!(f, "Chart error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status for this error, following the context chain.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::NoData => StatusCode::BAD_REQUEST,
            AppError::ChartError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::WithContext { source, .. } => source.status(),
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into the `{status: "error", message}` envelope.
    ///
    /// Client faults echo the raw description; server faults are logged and
    /// reported generically.
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::BadRequest(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                msg.clone()
            }
            AppError::NoData => NO_DATA_MESSAGE.to_string(),
            AppError::ChartError(msg) => {
                tracing::error!("Chart rendering failed: {}", msg);
                "Chart rendering failed".to_string()
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                return source.as_ref().clone().into_response();
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<crate::models::TableShapeError> for AppError {
    fn from(err: crate::models::TableShapeError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("background task failed: {}", err))
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NoData.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::ChartError("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_context_keeps_source_status() {
        let result: Result<(), AppError> = Err(AppError::NoData);
        let err = result.context("loading summary").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "loading summary: No data available");
    }

    #[test]
    fn test_with_context_is_lazy_on_success() {
        let result: Result<u8, AppError> = Ok(7);
        let value = result
            .with_context(|| panic!("context must not be built on success"))
            .unwrap();
        assert_eq!(value, 7);
    }
}
