use crate::services::workflow::WorkflowError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Malformed upload body: {0}")]
    ParseError(anyhow::Error),

    #[error("Missing file field '{0}'")]
    MissingFile(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error_message, details) = match self {
            AppError::ParseError(err) => (
                StatusCode::BAD_REQUEST,
                "Malformed upload body".to_string(),
                Some(err.to_string()),
            ),
            AppError::MissingFile(field) => (
                StatusCode::BAD_REQUEST,
                format!("Missing file field '{}'", field),
                None,
            ),
            AppError::Workflow(err) => {
                let status = match &err {
                    WorkflowError::PollTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::BAD_GATEWAY,
                };
                let message = match &err {
                    WorkflowError::Upload(_) => "Remote upload failed",
                    WorkflowError::StatusCheck(_) => "Remote status check failed",
                    WorkflowError::RemoteProcessing { .. } => "Remote processing failed",
                    WorkflowError::PollTimeout { .. } => "Remote processing timed out",
                    WorkflowError::Generation(_) => "Generation failed",
                };
                (status, message.to_string(), Some(err.to_string()))
            }
            AppError::InternalError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(err.to_string()),
            ),
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}
