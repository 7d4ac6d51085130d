use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use uuid::Uuid;

use crate::{
    handlers::{HandlerError, SuccessResponse},
    http_server::AppState,
    metrics::TICKET_QR_ISSUED_TOTAL,
    models::{
        ticket::{PurchaseTicketBody, Ticket, TicketQrResponse, TicketWithQr},
        user::User,
    },
    services::ticket_qr_service::TicketQrService,
    AppError,
};

#[derive(Debug, thiserror::Error)]
pub enum TicketHandlerError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    EventUnavailable(String),
    #[error("Ticket already scanned")]
    AlreadyScanned,
}

fn issue_qr_image(state: &AppState, ticket: &Ticket) -> Result<String, AppError> {
    let issued = TicketQrService::issue(
        &ticket.id.to_string(),
        &ticket.user_id.to_string(),
        &ticket.event_id.to_string(),
        state.config.get_qr_secret(),
    )?;
    TICKET_QR_ISSUED_TOTAL.inc();

    Ok(issued.data_uri)
}

pub async fn purchase_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<PurchaseTicketBody>,
) -> Result<(StatusCode, Json<SuccessResponse<TicketWithQr>>), AppError> {
    let Some(event) = state.db.events.find_by_id(&body.event_id).await? else {
        return Err(AppError::Handler(HandlerError::Ticket(TicketHandlerError::NotFound(
            format!("Event with ID {} not found", body.event_id),
        ))));
    };

    if !event.is_on_sale() {
        return Err(AppError::Handler(HandlerError::Ticket(
            TicketHandlerError::EventUnavailable("Event is not available for ticket purchase".to_string()),
        )));
    }

    let ticket = state
        .db
        .tickets
        .create(&Ticket::new(user.id, &event, body.ticket_type))
        .await?;
    tracing::info!(ticket_id = %ticket.id, event_id = %event.id, "Ticket purchased");

    let qr_code_image = issue_qr_image(&state, &ticket)?;

    Ok((
        StatusCode::CREATED,
        SuccessResponse::new(TicketWithQr { ticket, qr_code_image }),
    ))
}

pub async fn list_my_tickets(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<SuccessResponse<Vec<Ticket>>>, AppError> {
    let tickets = state.db.tickets.find_by_user(&user.id).await?;

    Ok(SuccessResponse::new(tickets))
}

/// Re-issues a fresh QR for one of the caller's unscanned tickets.
pub async fn get_ticket_qr(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<TicketQrResponse>>, AppError> {
    let ticket = state
        .db
        .tickets
        .find_by_id(&ticket_id)
        .await?
        .filter(|ticket| ticket.user_id == user.id)
        .ok_or_else(|| {
            AppError::Handler(HandlerError::Ticket(TicketHandlerError::NotFound(format!(
                "Ticket with ID {} not found",
                ticket_id
            ))))
        })?;

    if ticket.is_scanned {
        return Err(AppError::Handler(HandlerError::Ticket(TicketHandlerError::AlreadyScanned)));
    }

    let qr_code_image = issue_qr_image(&state, &ticket)?;

    Ok(SuccessResponse::new(TicketQrResponse {
        ticket_id: ticket.id,
        qr_code_image,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            event::{Event, EventStatus},
            ticket::TicketType,
            user::UserRole,
        },
        repositories::{event::MockEventStore, ticket::MockTicketStore, user::MockUserStore},
        utils::test_app_state::{create_test_app_state, test_user},
    };
    use axum::{
        body::Body,
        http::Request,
        routing::{get, post},
        Router,
    };
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn event(status: EventStatus, cover_charge_cents: Option<i64>) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Warehouse Rave".to_string(),
            status,
            cover_charge_cents,
            starts_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ticket_router(events: MockEventStore, tickets: MockTicketStore, user: User) -> Router {
        let state = create_test_app_state(MockUserStore::new(), events, tickets);
        Router::new()
            .route("/tickets", post(purchase_ticket))
            .route("/tickets/my", get(list_my_tickets))
            .route("/tickets/:ticket_id/qr", get(get_ticket_qr))
            .layer(Extension(user))
            .with_state(state)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap())
    }

    fn purchase_request(event_id: Uuid, ticket_type: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/tickets")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "eventId": event_id, "type": ticket_type }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_purchase_ticket_returns_signed_qr() {
        let user = test_user("1001", UserRole::User);
        let user_id = user.id;
        let published = event(EventStatus::Published, Some(2_500));
        let event_id = published.id;

        let mut events = MockEventStore::new();
        events.expect_find_by_id().returning(move |_| Ok(Some(published.clone())));
        let mut tickets = MockTicketStore::new();
        tickets
            .expect_create()
            .withf(move |ticket| ticket.user_id == user_id && ticket.price_cents == 5_000)
            .times(1)
            .returning(|ticket| Ok(ticket.clone()));

        let (status, body) = send(ticket_router(events, tickets, user), purchase_request(event_id, "VIP")).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["event_id"], event_id.to_string());
        assert_eq!(body["data"]["ticket_type"], "VIP");
        assert_eq!(body["data"]["is_scanned"], false);
        assert!(body["data"]["qr_code_image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_purchase_ticket_unknown_event() {
        let mut events = MockEventStore::new();
        events.expect_find_by_id().returning(|_| Ok(None));
        let mut tickets = MockTicketStore::new();
        tickets.expect_create().never();

        let event_id = Uuid::new_v4();
        let user = test_user("1001", UserRole::User);
        let (status, body) = send(ticket_router(events, tickets, user), purchase_request(event_id, "REGULAR")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], format!("Event with ID {} not found", event_id));
    }

    #[tokio::test]
    async fn test_purchase_ticket_draft_event() {
        let draft = event(EventStatus::Draft, None);
        let event_id = draft.id;
        let mut events = MockEventStore::new();
        events.expect_find_by_id().returning(move |_| Ok(Some(draft.clone())));
        let mut tickets = MockTicketStore::new();
        tickets.expect_create().never();

        let user = test_user("1001", UserRole::User);
        let (status, body) = send(ticket_router(events, tickets, user), purchase_request(event_id, "REGULAR")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Event is not available for ticket purchase");
    }

    #[tokio::test]
    async fn test_list_my_tickets() {
        let user = test_user("1001", UserRole::User);
        let user_id = user.id;
        let on_sale = event(EventStatus::Published, None);
        let owned = vec![
            Ticket::new(user_id, &on_sale, TicketType::Regular),
            Ticket::new(user_id, &on_sale, TicketType::Vip),
        ];

        let mut tickets = MockTicketStore::new();
        tickets
            .expect_find_by_user()
            .withf(move |id| *id == user_id)
            .returning(move |_| Ok(owned.clone()));

        let request = Request::builder().uri("/tickets/my").body(Body::empty()).unwrap();
        let (status, body) = send(ticket_router(MockEventStore::new(), tickets, user), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ticket_qr_hidden_from_other_users() {
        let owner = test_user("1001", UserRole::User);
        let stranger = test_user("2002", UserRole::User);
        let ticket = Ticket::new(owner.id, &event(EventStatus::Published, None), TicketType::Regular);
        let ticket_id = ticket.id;

        let mut tickets = MockTicketStore::new();
        tickets.expect_find_by_id().returning(move |_| Ok(Some(ticket.clone())));

        let request = Request::builder()
            .uri(format!("/tickets/{}/qr", ticket_id))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(ticket_router(MockEventStore::new(), tickets, stranger), request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ticket_qr_refused_after_scan() {
        let owner = test_user("1001", UserRole::User);
        let mut ticket = Ticket::new(owner.id, &event(EventStatus::Published, None), TicketType::Regular);
        ticket.is_scanned = true;
        let ticket_id = ticket.id;

        let mut tickets = MockTicketStore::new();
        tickets.expect_find_by_id().returning(move |_| Ok(Some(ticket.clone())));

        let request = Request::builder()
            .uri(format!("/tickets/{}/qr", ticket_id))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(ticket_router(MockEventStore::new(), tickets, owner), request).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Ticket already scanned");
    }

    #[tokio::test]
    async fn test_ticket_qr_reissued_for_owner() {
        let owner = test_user("1001", UserRole::User);
        let ticket = Ticket::new(owner.id, &event(EventStatus::Published, None), TicketType::Regular);
        let ticket_id = ticket.id;

        let mut tickets = MockTicketStore::new();
        tickets.expect_find_by_id().returning(move |_| Ok(Some(ticket.clone())));

        let request = Request::builder()
            .uri(format!("/tickets/{}/qr", ticket_id))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(ticket_router(MockEventStore::new(), tickets, owner), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["ticket_id"], ticket_id.to_string());
        assert!(body["data"]["qr_code_image"].as_str().unwrap().starts_with("data:image/png;base64,"));
    }
}
