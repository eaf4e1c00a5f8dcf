use crate::config::ConfigError;
use crate::scenario::ValidationError;
use crate::telemetry::TelemetryError;
use crate::workbook::WorkbookError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Scenario(ValidationError),
    Workbook(WorkbookError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "invalid service configuration: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry setup failed: {}", err),
            AppError::Io(err) => write!(f, "file access error: {}", err),
            AppError::Server(err) => write!(f, "http server error: {}", err),
            AppError::Scenario(err) => write!(f, "scenario validation error: {}", err),
            AppError::Workbook(err) => write!(f, "workbook import error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Scenario(err) => Some(err),
            AppError::Workbook(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Scenario(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Workbook(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        Self::Scenario(value)
    }
}

impl From<WorkbookError> for AppError {
    fn from(value: WorkbookError) -> Self {
        Self::Workbook(value)
    }
}
