//! Domain service for account lifecycle and token issuance.
//!
//! Handles registration, login, token refresh, password changes and the
//! email-based password reset flow.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{NewUser, User};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately covers unknown user, wrong password and inactive
    /// account so login responses cannot be used to probe for accounts.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Access/refresh token pair returned by login, register and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and returns the user with a fresh token pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] when the email or username is taken.
    async fn register(&self, input: NewUser) -> Result<(User, TokenPair), AuthError>;

    /// Verifies credentials and mints a token pair. The identifier may be
    /// a username or an email address.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails for any reason.
    async fn login(&self, identifier: &str, password: &str) -> Result<(User, TokenPair), AuthError>;

    /// Exchanges a valid refresh token for a new token pair.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Verifies an access token and returns the subject user id.
    fn verify_access_token(&self, token: &str) -> Result<Uuid, AuthError>;

    /// Changes a user's password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is incorrect
    /// or the new password is invalid.
    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Starts the password reset flow for the given email. Always succeeds
    /// from the caller's perspective, whether or not the account exists.
    async fn initiate_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Completes the password reset flow with a reset token from email.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError>;
}
