use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
    Json,
};

use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use crate::{
    handlers::ErrorResponse,
    http_server::AppState,
    models::{auth::TokenClaims, user::User},
    utils::{jwt::extract_jwt_token_from_request, pii_masker::mask_token},
};

type AuthRejection = (StatusCode, Json<ErrorResponse>);

fn reject(status: StatusCode, message: impl Into<String>) -> AuthRejection {
    let json_error = ErrorResponse {
        status: "fail",
        message: message.into(),
    };
    (status, Json(json_error))
}

async fn authenticate(state: &AppState, token: &str) -> Result<(User, TokenClaims), AuthRejection> {
    let claims = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(state.config.jwt.secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!(token = %mask_token(token), "Rejected token: {}", e);
        reject(StatusCode::UNAUTHORIZED, "Invalid token")
    })?
    .claims;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| reject(StatusCode::UNAUTHORIZED, "Invalid token"))?;

    let user = state.db.users.find_by_id(&user_id).await.map_err(|e| {
        tracing::error!("Error fetching user from database: {}", e);
        reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
    })?;

    let user = user.ok_or_else(|| {
        reject(
            StatusCode::UNAUTHORIZED,
            "The user belonging to this token not exists",
        )
    })?;

    if !user.is_active {
        return Err(reject(StatusCode::UNAUTHORIZED, "User account is disabled"));
    }

    Ok((user, claims))
}

pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AuthRejection> {
    let token = extract_jwt_token_from_request(&req)?;
    let (user, claims) = authenticate(&state, &token).await?;

    req.extensions_mut().insert(user);
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Like [`jwt_auth`], but only lets door staff through. The role is read
/// from the stored user so a demotion takes effect before the token expires.
pub async fn door_staff_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AuthRejection> {
    let token = extract_jwt_token_from_request(&req)?;
    let (user, claims) = authenticate(&state, &token).await?;

    if !user.session_role().can_scan_tickets() {
        return Err(reject(
            StatusCode::FORBIDDEN,
            "Only door staff can scan tickets",
        ));
    }

    req.extensions_mut().insert(user);
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
