use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;

use crate::error::{AppError, Result};

/// Shared AWS settings for the SES and S3 clients. Static credentials are
/// used when both keys are present, otherwise the default provider chain.
pub async fn load_sdk_config(region: &str) -> Result<SdkConfig> {
    let loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

    let access_key = std::env::var("AWS_ACCESS_KEY_ID").ok();
    let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").ok();

    let loader = match (access_key, secret_key) {
        (Some(access_key), Some(secret_key)) => loader.credentials_provider(Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            "env-credentials",
        )),
        (None, None) => loader,
        _ => {
            return Err(AppError::ConfigError(
                "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together".to_string(),
            ));
        }
    };

    Ok(loader.load().await)
}
