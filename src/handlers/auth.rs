use axum::{extract::State, response::Json, Extension};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, info, warn};

use crate::{
    handlers::{HandlerError, SuccessResponse},
    http_server::AppState,
    metrics::INIT_DATA_VALIDATIONS_TOTAL,
    models::{
        auth::{BrowserLoginBody, BrowserLoginResponse, TelegramLoginResponse},
        init_data::TelegramAuthBody,
        user::{User, UserInput, UserProfileUpdate, UserResponse},
    },
    services::telegram_auth_service::TelegramAuthService,
    utils::{
        jwt::issue_access_token,
        pii_masker::{mask_id, mask_name, mask_username},
    },
    AppError,
};

#[derive(Debug, thiserror::Error)]
pub enum AuthHandlerError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
}

/// Compares two secrets in constant time by MACing both under the same key
/// and checking the fixed-length tags with `verify_slice`.
fn secrets_match(provided: &str, expected: &str) -> bool {
    const COMPARE_KEY: &[u8] = b"nightpass-browser-login";

    let Ok(mut expected_mac) = Hmac::<Sha256>::new_from_slice(COMPARE_KEY) else {
        return false;
    };
    expected_mac.update(expected.as_bytes());
    let expected_tag = expected_mac.finalize().into_bytes();

    let Ok(mut provided_mac) = Hmac::<Sha256>::new_from_slice(COMPARE_KEY) else {
        return false;
    };
    provided_mac.update(provided.as_bytes());

    provided_mac.verify_slice(&expected_tag).is_ok()
}

fn unauthorized(message: &str) -> AppError {
    AppError::Handler(HandlerError::Auth(AuthHandlerError::Unauthorized(message.to_string())))
}

pub async fn validate_telegram_webapp(
    State(state): State<AppState>,
    Json(body): Json<TelegramAuthBody>,
) -> Result<Json<TelegramLoginResponse>, AppError> {
    let Some(parsed) = TelegramAuthService::verify_init_data(&body.init_data, state.config.get_bot_token()) else {
        INIT_DATA_VALIDATIONS_TOTAL.with_label_values(&["invalid"]).inc();
        warn!("Rejected Telegram initData with bad signature");
        return Err(unauthorized("Invalid Telegram initData"));
    };

    let Some(tg_user) = parsed.user else {
        INIT_DATA_VALIDATIONS_TOTAL.with_label_values(&["missing_user"]).inc();
        return Err(unauthorized("User data not found in initData"));
    };
    INIT_DATA_VALIDATIONS_TOTAL.with_label_values(&["valid"]).inc();

    let telegram_id = tg_user.id.to_string();
    let user = match state.db.users.find_by_telegram_id(&telegram_id).await? {
        Some(existing) => {
            debug!(telegram_id = %mask_id(&telegram_id), "Refreshing Telegram profile");
            state
                .db
                .users
                .update_profile(&existing.id, &UserProfileUpdate::from_telegram(&tg_user))
                .await?
        }
        None => {
            info!(
                telegram_id = %mask_id(&telegram_id),
                first_name = %mask_name(&tg_user.first_name),
                "Registering new Telegram user"
            );
            let user = User::new(UserInput::from_telegram(&tg_user))?;
            state.db.users.create(&user).await?
        }
    };

    if !user.is_active {
        return Err(AppError::Handler(HandlerError::Auth(AuthHandlerError::Forbidden(
            "User account is disabled".to_string(),
        ))));
    }

    let access_token = issue_access_token(&state.config, &user)?;

    Ok(Json(TelegramLoginResponse {
        access_token,
        user: UserResponse::from(&user),
    }))
}

/// Password-style login for staff working from a desktop browser.
pub async fn browser_login(
    State(state): State<AppState>,
    Json(body): Json<BrowserLoginBody>,
) -> Result<Json<BrowserLoginResponse>, AppError> {
    let expected = state.config.telegram.browser_login_secret.as_deref().unwrap_or_default();
    if expected.is_empty() || !secrets_match(&body.secret, expected) {
        warn!(username = %mask_username(&body.username), "Browser login rejected");
        return Err(unauthorized("Invalid secret"));
    }

    let user = match state.db.users.find_by_username(&body.username).await? {
        Some(user) => user,
        None => {
            info!(username = %mask_username(&body.username), "Creating browser admin");
            let user = User::new(UserInput::browser_admin(&body.username))?;
            state.db.users.create(&user).await?
        }
    };

    let access_token = issue_access_token(&state.config, &user)?;

    Ok(Json(BrowserLoginResponse { access_token }))
}

pub async fn auth_me(Extension(user): Extension<User>) -> Json<SuccessResponse<UserResponse>> {
    SuccessResponse::new(UserResponse::from(&user))
}
