use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    pub security: SecurityConfig,

    pub email: EmailConfig,

    pub storage: StorageConfig,

    pub billing: BillingConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/forgefit.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Request timeout for outbound HTTP clients in seconds (default: 30)
    pub http_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            http_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. Override with FORGEFIT_JWT_SECRET in production.
    pub jwt_secret: String,

    pub access_token_expire_minutes: i64,

    pub refresh_token_expire_days: i64,

    pub reset_token_expire_minutes: i64,

    /// Base URL used when building password-reset links in emails
    pub frontend_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-before-deploying".to_string(),
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 7,
            reset_token_expire_minutes: 60,
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    /// Lower values reduce memory usage but decrease GPU resistance.
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,

    /// HTTP mail provider endpoint
    pub api_url: String,

    /// Provider API key. Override with FORGEFIT_MAIL_API_KEY.
    pub api_key: String,

    pub from_address: String,

    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.resend.com/emails".to_string(),
            api_key: String::new(),
            from_address: "no-reply@forgefit.app".to_string(),
            from_name: "ForgeFit".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub enabled: bool,

    pub bucket: String,

    pub region: String,

    /// Prefix applied to every stored object key
    pub key_prefix: String,

    /// Presigned URL lifetime in seconds (default: 900)
    pub presign_expiry_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bucket: String::new(),
            region: "us-east-1".to_string(),
            key_prefix: "exercise-images".to_string(),
            presign_expiry_seconds: 900,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Stripe webhook signing secret. Override with FORGEFIT_STRIPE_WEBHOOK_SECRET.
    pub stripe_webhook_secret: String,

    /// Accepted clock skew for webhook timestamps in seconds (default: 300)
    pub webhook_tolerance_seconds: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            stripe_webhook_secret: String::new(),
            webhook_tolerance_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets always win from the environment so they stay out of config.toml.
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("FORGEFIT_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(secret) = std::env::var("FORGEFIT_STRIPE_WEBHOOK_SECRET") {
            self.billing.stripe_webhook_secret = secret;
        }
        if let Ok(key) = std::env::var("FORGEFIT_MAIL_API_KEY") {
            self.email.api_key = key;
        }
        if let Ok(path) = std::env::var("FORGEFIT_DATABASE_PATH") {
            self.general.database_path = path;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("forgefit").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".forgefit").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("auth.jwt_secret cannot be empty");
        }

        if self.auth.access_token_expire_minutes <= 0 || self.auth.refresh_token_expire_days <= 0 {
            anyhow::bail!("Token expiries must be positive");
        }

        if self.storage.enabled && self.storage.bucket.is_empty() {
            anyhow::bail!("storage.bucket cannot be empty when storage is enabled");
        }

        if self.email.enabled && self.email.api_key.is_empty() {
            anyhow::bail!("email.api_key cannot be empty when email is enabled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.auth.access_token_expire_minutes, 30);
        assert_eq!(config.auth.refresh_token_expire_days, 7);
        assert_eq!(config.billing.webhook_tolerance_seconds, 300);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[auth]"));
        assert!(toml_str.contains("[billing]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [auth]
            access_token_expire_minutes = 5
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.auth.access_token_expire_minutes, 5);

        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let mut config = Config::default();
        config.auth.jwt_secret = String::new();
        assert!(config.validate().is_err());
    }
}
