use crate::error::{AppError, Result};
use rust_decimal::Decimal;
use std::{env, str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub s3: S3Config,
    pub pricing: PricingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }

    pub fn storage_prefix(self) -> &'static str {
        match self {
            Environment::Development => "products-development",
            Environment::Production => "products-production",
        }
    }
}

impl FromStr for Environment {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(AppError::ConfigError(format!(
                "Invalid APP_ENV value: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_days: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl_days", &self.ttl_days)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub enabled: bool,
    pub sender: String,
    pub admin_email: String,
    pub queue_capacity: usize,
    pub max_attempts: u32,
    pub retry_base_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub assets_url: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub free_shipping_threshold: Decimal,
    pub shipping_flat_rate: Decimal,
    pub tax_rate: Decimal,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        Ok(Self {
            environment: env_or("APP_ENV", "development")?,
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_or("PORT", "5000")?,
                max_body_size: env_or("MAX_BODY_SIZE", "10485760")?,
            },
            database: DatabaseConfig {
                url: env::var("DB_URL")?,
                max_connections: env_or("DB_MAX_CONNECTIONS", "20")?,
            },
            cors: CorsConfig {
                allowed_origins: env::var("FRONTEND_URL")?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET")
                    .map_err(|_| AppError::ConfigError("JWT_SECRET not set".to_string()))?,
                ttl_days: env_or("JWT_TTL_DAYS", "30")?,
            },
            email: EmailConfig {
                enabled: env_or("EMAIL_ENABLED", "true")?,
                sender: env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "noreply@beauteshop.com".to_string()),
                admin_email: env::var("ADMIN_EMAIL")
                    .unwrap_or_else(|_| "admin@beauteshop.com".to_string()),
                queue_capacity: env_or("EMAIL_QUEUE_CAPACITY", "256")?,
                max_attempts: env_or("EMAIL_MAX_ATTEMPTS", "3")?,
                retry_base_delay: Duration::from_millis(env_or("EMAIL_RETRY_BASE_MS", "500")?),
            },
            s3: S3Config {
                bucket: env::var("S3_BUCKET")
                    .map_err(|_| AppError::ConfigError("S3_BUCKET not set".to_string()))?,
                assets_url: env::var("ASSETS_URL")
                    .map_err(|_| AppError::ConfigError("ASSETS_URL not set".to_string()))?
                    .trim_end_matches('/')
                    .to_string(),
                region,
            },
            pricing: PricingConfig {
                free_shipping_threshold: env_or("FREE_SHIPPING_THRESHOLD", "50")?,
                shipping_flat_rate: env_or("SHIPPING_FLAT_RATE", "5")?,
                tax_rate: env_or("TAX_RATE", "0")?,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn env_or<T: FromStr>(name: &str, default: &str) -> Result<T> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    parse_value(name, &raw)
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::ConfigError(format!("Invalid {} value", name)))
}
