mod app_config;
mod aws_sdk;
mod s3_config;
mod ses_config;

pub use app_config::{
    AppConfig, CorsConfig, DatabaseConfig, EmailConfig, Environment, JwtConfig, PricingConfig,
    S3Config, ServerConfig,
};
pub use aws_sdk::load_sdk_config;
pub use s3_config::load_s3_client;
pub use ses_config::load_ses_client;
