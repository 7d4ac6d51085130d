use axum::{extract::State, response::Json, Extension};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    handlers::{HandlerError, SuccessResponse},
    http_server::AppState,
    metrics::TICKET_SCANS_TOTAL,
    models::{
        checkin::{ScanTicketBody, ScanTicketResponse},
        user::User,
    },
    services::ticket_qr_service::TicketQrService,
    utils::pii_masker::mask_id,
    AppError,
};

#[derive(Debug, thiserror::Error)]
pub enum CheckinHandlerError {
    #[error("Invalid QR code")]
    InvalidQr,
    #[error("QR code expired")]
    Expired,
    #[error("Ticket not found")]
    TicketNotFound,
    #[error("Ticket already scanned")]
    AlreadyScanned,
}

impl CheckinHandlerError {
    fn outcome(&self) -> &'static str {
        match self {
            CheckinHandlerError::InvalidQr => "invalid",
            CheckinHandlerError::Expired => "expired",
            CheckinHandlerError::TicketNotFound => "not_found",
            CheckinHandlerError::AlreadyScanned => "already_scanned",
        }
    }
}

fn rejected(err: CheckinHandlerError) -> AppError {
    TICKET_SCANS_TOTAL.with_label_values(&[err.outcome()]).inc();
    AppError::Handler(HandlerError::Checkin(err))
}

/// Door-side redemption of a scanned ticket QR.
pub async fn scan_ticket(
    State(state): State<AppState>,
    Extension(staff): Extension<User>,
    Json(body): Json<ScanTicketBody>,
) -> Result<Json<SuccessResponse<ScanTicketResponse>>, AppError> {
    let Some(token) = TicketQrService::parse(&body.qr_code) else {
        return Err(rejected(CheckinHandlerError::InvalidQr));
    };

    if !TicketQrService::verify(&token, state.config.get_qr_secret()) {
        warn!(ticket_id = %mask_id(&token.ticket_id), "QR signature mismatch");
        return Err(rejected(CheckinHandlerError::InvalidQr));
    }

    if TicketQrService::is_expired(&token, state.config.get_qr_max_age()) {
        return Err(rejected(CheckinHandlerError::Expired));
    }

    let Ok(ticket_id) = Uuid::parse_str(&token.ticket_id) else {
        return Err(rejected(CheckinHandlerError::InvalidQr));
    };

    let Some(ticket) = state.db.tickets.find_by_id(&ticket_id).await? else {
        return Err(rejected(CheckinHandlerError::TicketNotFound));
    };

    if ticket.user_id.to_string() != token.user_id || ticket.event_id.to_string() != token.event_id {
        warn!(ticket_id = %ticket.id, "QR claims do not match stored ticket");
        return Err(rejected(CheckinHandlerError::InvalidQr));
    }

    if ticket.is_scanned {
        return Err(rejected(CheckinHandlerError::AlreadyScanned));
    }

    let Some((ticket, checkin)) = state.db.tickets.redeem(&ticket.id, &staff.id).await? else {
        return Err(rejected(CheckinHandlerError::AlreadyScanned));
    };

    TICKET_SCANS_TOTAL.with_label_values(&["admitted"]).inc();
    info!(ticket_id = %ticket.id, scanned_by = %staff.id, "Ticket redeemed");

    Ok(SuccessResponse::new(ScanTicketResponse { checkin, ticket }))
}
