use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub paymongo: PaymongoConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// Public origin of the consumer dashboard. Gateway redirect URLs are
    /// only honored when they share this origin; anything else is replaced
    /// with the default success/failure paths below.
    pub base_url: String,
    pub success_redirect_path: String,
    pub failure_redirect_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymongoConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Base URL of the notification service that fans out in-app/email/SMS
    pub service_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                base_url: env::var("APP_BASE_URL")
                    .map_err(|_| AppError::Configuration("APP_BASE_URL not set".to_string()))?,
                success_redirect_path: env::var("PAYMENT_SUCCESS_PATH")
                    .unwrap_or_else(|_| "/payments/success".to_string()),
                failure_redirect_path: env::var("PAYMENT_FAILURE_PATH")
                    .unwrap_or_else(|_| "/payments/failed".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            paymongo: PaymongoConfig {
                secret_key: env::var("PAYMONGO_SECRET_KEY").map_err(|_| {
                    AppError::Configuration("PAYMONGO_SECRET_KEY not set".to_string())
                })?,
                webhook_secret: env::var("PAYMONGO_WEBHOOK_SECRET").map_err(|_| {
                    AppError::Configuration("PAYMONGO_WEBHOOK_SECRET not set".to_string())
                })?,
                base_url: env::var("PAYMONGO_BASE_URL")
                    .unwrap_or_else(|_| "https://api.paymongo.com/v1".to_string()),
            },
            notifications: NotificationConfig {
                service_url: env::var("NOTIFICATION_SERVICE_URL").map_err(|_| {
                    AppError::Configuration("NOTIFICATION_SERVICE_URL not set".to_string())
                })?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if reqwest::Url::parse(&self.app.base_url).is_err() {
            return Err(AppError::Configuration(
                "APP_BASE_URL must be an absolute URL".to_string(),
            ));
        }

        if self.paymongo.secret_key.trim().is_empty() {
            return Err(AppError::Configuration(
                "PAYMONGO_SECRET_KEY must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
