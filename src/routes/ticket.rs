use crate::{
    handlers::ticket::{get_ticket_qr, list_my_tickets, purchase_ticket},
    http_server::AppState,
    middlewares::jwt_auth,
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn ticket_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/tickets", post(purchase_ticket))
        .route("/tickets/my", get(list_my_tickets))
        .route("/tickets/:ticket_id/qr", get(get_ticket_qr))
        .layer(middleware::from_fn_with_state(state, jwt_auth::jwt_auth))
}
