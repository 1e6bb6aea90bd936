//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::clients::MailClient;
use crate::config::{AuthConfig, SecurityConfig};
use crate::db::{NewUser, Store, User};
use crate::services::auth_service::{AuthError, AuthService, TokenPair};
use crate::services::token::{TokenKind, TokenService};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: TokenService,
    mailer: Arc<MailClient>,
    security: SecurityConfig,
    frontend_url: String,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        auth_config: &AuthConfig,
        security: SecurityConfig,
        mailer: Arc<MailClient>,
    ) -> Self {
        Self {
            store,
            tokens: TokenService::from_config(auth_config),
            mailer,
            security,
            frontend_url: auth_config.frontend_url.clone(),
        }
    }

    fn mint_pair(&self, user_id: Uuid) -> Result<TokenPair, AuthError> {
        let access_token = self
            .tokens
            .mint(user_id, TokenKind::Access)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let refresh_token = self
            .tokens
            .mint(user_id, TokenKind::Refresh)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer",
        })
    }

    /// Look up by username first, then by email. Emails are stored
    /// trimmed and lowercased, so the fallback normalizes the same way.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, AuthError> {
        if let Some(user) = self.store.get_user_by_username(identifier).await? {
            return Ok(Some(user));
        }
        let email = identifier.trim().to_lowercase();
        Ok(self.store.get_user_by_email(&email).await?)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, input: NewUser) -> Result<(User, TokenPair), AuthError> {
        let mut input = input;
        input.email = input.email.trim().to_lowercase();
        input.username = input.username.trim().to_string();

        if self.store.user_exists_by_email(&input.email).await? {
            return Err(AuthError::Conflict("Email already registered".to_string()));
        }
        if self.store.user_exists_by_username(&input.username).await? {
            return Err(AuthError::Conflict("Username already taken".to_string()));
        }

        let user = self.store.create_user(input, &self.security).await?;
        let pair = self.mint_pair(user.id)?;

        // Welcome email is best-effort; registration never fails on it.
        let mailer = Arc::clone(&self.mailer);
        let email = user.email.clone();
        let username = user.username.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_welcome(&email, &username).await {
                warn!("Failed to send welcome email to {}: {}", email, e);
            }
        });

        Ok((user, pair))
    }

    async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(User, TokenPair), AuthError> {
        let user = self
            .find_by_identifier(identifier)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = self
            .store
            .verify_user_password(&user.username, password)
            .await?;

        if !is_valid || !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.mint_pair(user.id)?;
        Ok((user, pair))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let user_id = self
            .tokens
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|_| AuthError::InvalidToken)?;

        // Account state is re-checked so deactivation cuts off refresh.
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active {
            return Err(AuthError::InvalidToken);
        }

        self.mint_pair(user.id)
    }

    fn verify_access_token(&self, token: &str) -> Result<Uuid, AuthError> {
        self.tokens
            .verify(token, TokenKind::Access)
            .map_err(|_| AuthError::InvalidToken)
    }

    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.len() < 8 {
            return Err(AuthError::Validation(
                "New password must be at least 8 characters".to_string(),
            ));
        }

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = self
            .store
            .verify_user_password(&user.username, current_password)
            .await?;

        if !is_valid {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(&user.username, new_password, &self.security)
            .await?;

        Ok(())
    }

    async fn initiate_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim().to_lowercase();

        // Unknown addresses get the same outcome as known ones.
        let Some(user) = self.store.get_user_by_email(&email).await? else {
            return Ok(());
        };

        let token = self
            .tokens
            .mint(user.id, TokenKind::Reset)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let reset_link = format!("{}/reset-password?token={}", self.frontend_url, token);

        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            if let Err(e) = mailer.send_password_reset(&email, &reset_link).await {
                warn!("Failed to send password reset email to {}: {}", email, e);
            }
        });

        Ok(())
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        if new_password.len() < 8 {
            return Err(AuthError::Validation(
                "New password must be at least 8 characters".to_string(),
            ));
        }

        let user_id = self
            .tokens
            .verify(token, TokenKind::Reset)
            .map_err(|_| AuthError::InvalidToken)?;

        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.store
            .update_user_password(&user.username, new_password, &self.security)
            .await?;

        Ok(())
    }
}
