use anyhow::Result;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::EmailConfig;

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

/// Transactional email over an HTTP mail API.
///
/// When email is disabled in config, sends become no-ops so the rest of
/// the system (registration, password reset) works without a mail account.
pub struct MailClient {
    client: Client,
    config: EmailConfig,
}

impl MailClient {
    #[must_use]
    pub fn new(client: Client, config: EmailConfig) -> Self {
        Self { client, config }
    }

    async fn send(&self, to: &str, subject: &str, html: String) -> Result<()> {
        if !self.config.enabled {
            debug!("Email disabled, skipping '{}' to {}", subject, to);
            return Ok(());
        }

        let message = OutboundMessage {
            from: format!("{} <{}>", self.config.from_name, self.config.from_address),
            to: [to],
            subject,
            html,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Mail API returned {status}: {body}");
        }

        info!("Sent '{}' email to {}", subject, to);
        Ok(())
    }

    pub async fn send_welcome(&self, to: &str, username: &str) -> Result<()> {
        let html = format!(
            "<h1>Welcome, {username}!</h1>\
             <p>Your account is ready. Log your first workout to get started.</p>"
        );
        self.send(to, "Welcome aboard", html).await
    }

    pub async fn send_password_reset(&self, to: &str, reset_link: &str) -> Result<()> {
        let html = format!(
            "<p>A password reset was requested for your account.</p>\
             <p><a href=\"{reset_link}\">Reset your password</a></p>\
             <p>The link expires shortly. If you did not request this, ignore this email.</p>"
        );
        self.send(to, "Password reset", html).await
    }

    pub async fn send_subscription_confirmation(
        &self,
        to: &str,
        plan_name: &str,
        amount_cents: i32,
        next_billing_date: Option<&str>,
    ) -> Result<()> {
        let amount = format!("${}.{:02}", amount_cents / 100, amount_cents % 100);
        let renewal = next_billing_date
            .map(|d| format!("<p>Next billing date: {d}</p>"))
            .unwrap_or_default();
        let html = format!(
            "<h1>Payment received</h1>\
             <p>Your {plan_name} subscription is active. You were charged {amount}.</p>\
             {renewal}"
        );
        self.send(to, "Subscription confirmed", html).await
    }
}
