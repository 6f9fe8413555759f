use aws_config::SdkConfig;
use aws_sdk_sesv2::Client as SesClient;

pub fn load_ses_client(sdk_config: &SdkConfig) -> SesClient {
    let ses_client = SesClient::new(sdk_config);

    tracing::info!("AWS SES client initialized");

    ses_client
}
