use auth::auth_routes;
use axum::Router;
use checkin::checkin_routes;
use ticket::ticket_routes;

use crate::http_server::AppState;

pub mod auth;
pub mod checkin;
pub mod ticket;

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth_routes(state.clone()))
        .merge(ticket_routes(state.clone()))
        .merge(checkin_routes(state))
}
