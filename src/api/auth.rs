use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{validate_email, validate_password, validate_username};
use super::{ApiError, ApiResponse, AppState, AuthResponse, MessageResponse};
use crate::db::NewUser;
use crate::services::TokenPair;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub height_cm: Option<f32>,
    pub weight_kg: Option<f32>,
    pub date_of_birth: Option<String>,
    pub fitness_goal: Option<String>,
    pub training_experience: Option<String>,
    pub training_frequency: Option<i32>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username or email address.
    pub identifier: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// The authenticated user, inserted into request extensions by
/// [`auth_middleware`]. Handlers extract it with `Extension<CurrentUser>`.
#[derive(Clone)]
pub struct CurrentUser(pub crate::db::User);

/// Authentication middleware for protected routes.
///
/// Expects `Authorization: Bearer <access token>`. The user row is loaded
/// on every request so deactivated accounts are rejected immediately,
/// not when their token expires.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication token".to_string()))?;

    let user_id = state.shared.auth_service.verify_access_token(&token)?;

    let user = state
        .store()
        .get_user(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized(
            "Invalid or expired token".to_string(),
        ));
    }

    tracing::Span::current().record("user_id", user.id.to_string());
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account and return the user with a token pair
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email(&payload.email)?;
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    let input = NewUser {
        email: payload.email,
        username: payload.username,
        password: payload.password,
        full_name: payload.full_name,
        height_cm: payload.height_cm,
        weight_kg: payload.weight_kg,
        date_of_birth: payload.date_of_birth,
        fitness_goal: payload.fitness_goal,
        training_experience: payload.training_experience,
        training_frequency: payload.training_frequency,
    };

    let (user, tokens) = state.shared.auth_service.register(input).await?;

    tracing::info!("New account registered: {}", user.username);

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ApiResponse::success(AuthResponse::new(user, tokens))),
    ))
}

/// POST /auth/login
/// Authenticate with username or email, returns a token pair on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    if payload.identifier.is_empty() {
        return Err(ApiError::validation("Username or email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let (user, tokens) = state
        .shared
        .auth_service
        .login(&payload.identifier, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(AuthResponse::new(user, tokens))))
}

/// POST /auth/refresh
/// Exchange a refresh token for a new token pair
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let tokens = state
        .shared
        .auth_service
        .refresh(&payload.refresh_token)
        .await?;

    Ok(Json(ApiResponse::success(tokens)))
}

/// POST /auth/password/forgot
/// Start the password reset flow. The response never reveals whether
/// the email belongs to an account.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    state
        .shared
        .auth_service
        .initiate_password_reset(&payload.email)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "If that email is registered, a reset link has been sent",
    ))))
}

/// POST /auth/password/reset
/// Complete the password reset flow with a token from email
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .auth_service
        .reset_password(&payload.token, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

/// PUT /auth/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .auth_service
        .change_password(
            current.0.id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    tracing::info!("Password changed for user: {}", current.0.username);

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}
