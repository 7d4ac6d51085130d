use axum::Json;
use serde::Serialize;

use crate::handlers::{auth::AuthHandlerError, checkin::CheckinHandlerError, ticket::TicketHandlerError};

pub mod auth;
pub mod checkin;
pub mod ticket;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Auth(#[from] AuthHandlerError),
    #[error("{0}")]
    Ticket(#[from] TicketHandlerError),
    #[error("{0}")]
    Checkin(#[from] CheckinHandlerError),
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    data: T,
}
impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Json<Self> {
        Json(Self { data })
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}
