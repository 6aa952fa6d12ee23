use crate::applications::media::MediaError;
use crate::applications::router::FormError;
use crate::applications::{ApplicationServiceError, RepositoryError};
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
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
    Media(MediaError),
    Form(FormError),
    Application(ApplicationServiceError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Form(err) => err.status(),
            AppError::Application(err) => match err {
                ApplicationServiceError::Intake(_)
                | ApplicationServiceError::MissingDocuments { .. }
                | ApplicationServiceError::UnexpectedDocument(_)
                | ApplicationServiceError::DuplicateDocument(_) => StatusCode::BAD_REQUEST,
                ApplicationServiceError::Repository(RepositoryError::NotFound) => {
                    StatusCode::NOT_FOUND
                }
                ApplicationServiceError::Repository(RepositoryError::Conflict { .. }) => {
                    StatusCode::CONFLICT
                }
                ApplicationServiceError::Repository(RepositoryError::Unavailable(_)) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                ApplicationServiceError::Media(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::Media(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Media(err) => write!(f, "media error: {}", err),
            AppError::Form(err) => write!(f, "{}", err),
            AppError::Application(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Media(err) => Some(err),
            AppError::Form(err) => Some(err),
            AppError::Application(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }

        let body = Json(json!({ "success": false, "message": self.to_string() }));
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

impl From<MediaError> for AppError {
    fn from(value: MediaError) -> Self {
        Self::Media(value)
    }
}

impl From<FormError> for AppError {
    fn from(value: FormError) -> Self {
        Self::Form(value)
    }
}

impl From<ApplicationServiceError> for AppError {
    fn from(value: ApplicationServiceError) -> Self {
        Self::Application(value)
    }
}
