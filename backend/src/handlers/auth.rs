//! Account handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthSession, SignupInput};
use crate::services::AuthService;
use crate::AppState;
use shared::{normalize_phone, validate_username, ProfileEdit, User, UserToggles};

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub phone: Option<String>,
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub add_to_home: bool,
    #[serde(default)]
    pub stay_logged_in: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub user: User,
}

/// Create an account and sign in
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthSession>)> {
    body.validate()?;
    validate_username(&body.username).map_err(|m| AppError::field("username", m))?;

    // Bare digits are accepted and stored in display form
    let phone = match body.phone.as_deref() {
        Some(raw) => normalize_phone(raw).map_err(|m| AppError::field("phone", m))?,
        None => None,
    };

    let input = SignupInput {
        username: body.username,
        email: body.email.to_lowercase(),
        phone,
        profile_pic: body.profile_pic,
        toggles: UserToggles {
            add_to_home: body.add_to_home,
            stay_logged_in: body.stay_logged_in,
        },
    };

    let service = AuthService::new(state.db, &state.config);
    let session = service.signup(input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Sign in by email
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthSession>> {
    body.validate()?;
    let service = AuthService::new(state.db, &state.config);
    let session = service.login(&body.email.to_lowercase()).await?;
    Ok(Json(session))
}

/// Return the account behind the bearer token
pub async fn verify(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<VerifyResponse>> {
    let service = AuthService::new(state.db, &state.config);
    let user = service.current_user(current_user.0.user_id).await?;
    Ok(Json(VerifyResponse { user }))
}

/// Edit username, phone, picture, or preferences
pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(edit): Json<ProfileEdit>,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db, &state.config);
    let user = service
        .update_profile(current_user.0.user_id, &edit)
        .await?;
    Ok(Json(user))
}
