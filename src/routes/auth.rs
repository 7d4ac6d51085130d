use crate::{
    handlers::auth::{auth_me, browser_login, validate_telegram_webapp},
    http_server::AppState,
    middlewares::jwt_auth,
};
use axum::{
    handler::Handler,
    middleware,
    routing::{get, post},
    Router,
};

pub fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/tg/webapp/validate", post(validate_telegram_webapp))
        .route("/auth/browser-login", post(browser_login))
        .route(
            "/auth/me",
            get(auth_me.layer(middleware::from_fn_with_state(state, jwt_auth::jwt_auth))),
        )
}
