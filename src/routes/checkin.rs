use crate::{handlers::checkin::scan_ticket, http_server::AppState, middlewares::jwt_auth};
use axum::{handler::Handler, middleware, routing::post, Router};

pub fn checkin_routes(state: AppState) -> Router<AppState> {
    Router::new().route(
        "/checkin/scan",
        post(scan_ticket.layer(middleware::from_fn_with_state(state, jwt_auth::door_staff_auth))),
    )
}
