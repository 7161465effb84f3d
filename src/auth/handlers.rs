//! Account API handlers

use crate::api::handlers::AppState;
use crate::auth::middleware::AuthUser;
use crate::auth::models::{
    AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    UserActionResponse, UserResponse,
};
use crate::core::error::{Result, TextpertError};
use crate::db::models::{CompanyUpdate, User, UserUpdate};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(TextpertError::ValidationError(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn user_not_found() -> TextpertError {
    TextpertError::NotFound("User not found".to_string())
}

/// Look up `email` and check `password` against it
async fn check_credentials(state: &AppState, email: &str, password: String) -> Result<User> {
    let Some(user) = state.accounts.find_by_email(email).await? else {
        state.credentials.verify_missing_blocking(password).await?;
        return Err(TextpertError::InvalidCredentials);
    };

    let valid = state
        .credentials
        .verify_blocking(password, user.password_hash.clone())
        .await?;
    if !valid {
        return Err(TextpertError::InvalidCredentials);
    }

    Ok(user)
}

/// Handler for POST /register
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = body?;
    require_non_empty("email", &req.email)?;
    require_non_empty("password", &req.password)?;

    tracing::info!(email = %req.email, "User registration attempt");

    let password_hash = state.credentials.hash_blocking(req.password.clone()).await?;
    let user = state.accounts.create(req.into_new_user(password_hash)).await?;
    let token = state.credentials.registration_token(user.id)?;

    tracing::info!(user_id = user.id, email = %user.email, "User registered successfully");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: user.into(),
            token,
        }),
    ))
}

/// Handler for POST /login
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(req) = body?;
    tracing::info!(email = %req.email, "Login attempt");

    let user = check_credentials(&state, &req.email, req.password)
        .await
        .map_err(|e| {
            tracing::warn!(email = %req.email, error = %e, "Login failed");
            e
        })?;
    let token = state.credentials.login_token(user.id)?;

    tracing::info!(user_id = user.id, "Login successful");

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: user.into(),
        token,
    }))
}

/// Handler for POST /change-password
///
/// Unauthenticated: the old password is the proof of ownership.
pub async fn change_password(
    State(state): State<AppState>,
    body: std::result::Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(req) = body?;
    require_non_empty("email", &req.email)?;
    require_non_empty("newPassword", &req.new_password)?;

    let user = check_credentials(&state, &req.email, req.old_password).await?;

    let password_hash = state.credentials.hash_blocking(req.new_password).await?;
    if !state.accounts.update_password(user.id, &password_hash).await? {
        return Err(user_not_found());
    }

    tracing::info!(user_id = user.id, "Password changed");

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// Handler for GET /me
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserResponse>> {
    tracing::debug!(user_id = user.id, "Getting current user profile");

    let account = state
        .accounts
        .find_by_id(user.id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(account.into()))
}

async fn apply_update(
    state: &AppState,
    user: AuthUser,
    update: UserUpdate,
    message: &str,
) -> Result<Json<UserActionResponse>> {
    let account = state
        .accounts
        .update(user.id, &update)
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = user.id, "{}", message);

    Ok(Json(UserActionResponse {
        message: message.to_string(),
        user: account.into(),
    }))
}

/// Handler for PUT /me
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    body: std::result::Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<UserActionResponse>> {
    let Json(update) = body?;
    apply_update(&state, user, update, "User profile updated successfully").await
}

/// Handler for PUT /company
pub async fn update_company(
    State(state): State<AppState>,
    user: AuthUser,
    body: std::result::Result<Json<CompanyUpdate>, JsonRejection>,
) -> Result<Json<UserActionResponse>> {
    let Json(company) = body?;
    apply_update(&state, user, company.into(), "User company updated successfully").await
}
