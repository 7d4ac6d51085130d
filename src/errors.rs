use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::{
    db_persistence::DbError,
    handlers::{
        auth::AuthHandlerError, checkin::CheckinHandlerError, ticket::TicketHandlerError, ErrorResponse,
        HandlerError,
    },
    services::ticket_qr_service::TicketQrError,
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Validation failed: {0}")]
    ValidationErrors(ValidationErrors),
    #[error("{0}")]
    Handler(#[from] HandlerError),
    #[error("QR error: {0}")]
    TicketQr(#[from] TicketQrError),
    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Server error: {0}")]
    Server(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(DbError::RecordNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::ValidationErrors(_) => StatusCode::BAD_REQUEST,
            AppError::Handler(HandlerError::Auth(err)) => match err {
                AuthHandlerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                AuthHandlerError::Forbidden(_) => StatusCode::FORBIDDEN,
            },
            AppError::Handler(HandlerError::Ticket(err)) => match err {
                TicketHandlerError::NotFound(_) => StatusCode::NOT_FOUND,
                TicketHandlerError::EventUnavailable(_) => StatusCode::BAD_REQUEST,
                TicketHandlerError::AlreadyScanned => StatusCode::CONFLICT,
            },
            AppError::Handler(HandlerError::Checkin(err)) => match err {
                CheckinHandlerError::InvalidQr | CheckinHandlerError::Expired => StatusCode::BAD_REQUEST,
                CheckinHandlerError::TicketNotFound => StatusCode::NOT_FOUND,
                CheckinHandlerError::AlreadyScanned => StatusCode::CONFLICT,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            String::from("Internal server error.")
        } else {
            self.to_string()
        };

        let body = Json(ErrorResponse {
            status: "fail",
            message,
        });

        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    field: String,
    message: String,
}

// Collection of validation errors
#[derive(Debug, Serialize, Default)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}
impl ValidationErrors {
    pub fn new() -> Self {
        ValidationErrors { errors: Vec::new() }
    }

    pub fn add(&mut self, field: &str, error: String) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: error,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join(", ");

        write!(f, "{}", joined)
    }
}
