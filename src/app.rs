use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
};
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::{self, AppConfig, CorsConfig, Environment},
    database,
    error::{AppError, Result},
    middleware::expose_error_detail,
    routes,
    services::{
        email_service::{LogMailer, Mailer, SesMailer},
        image_service::ImageStore,
        notification_service::{Notifier, RetryPolicy},
        pricing_service::PricingPolicy,
    },
    utils::jwt::JwtKeys,
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt: JwtKeys,
    pub notifier: Notifier,
    pub images: ImageStore,
    pub pricing: PricingPolicy,
    pub admin_email: String,
}

/// Connects every collaborator and returns the router together with the
/// email worker, which finishes once the router and its state are dropped.
pub async fn build(config: &AppConfig) -> Result<(Router, JoinHandle<()>)> {
    let pool = database::create_pool(&config.database).await?;
    let sdk_config = config::load_sdk_config(&config.s3.region).await?;

    let mailer: Arc<dyn Mailer> = if config.email.enabled {
        Arc::new(SesMailer::new(
            config::load_ses_client(&sdk_config),
            config.email.sender.clone(),
        ))
    } else {
        tracing::warn!("EMAIL_ENABLED=false, emails will only be logged");
        Arc::new(LogMailer)
    };

    let (notifier, worker) = Notifier::spawn(
        mailer,
        RetryPolicy::from_config(&config.email),
        config.email.queue_capacity,
    );

    let state = AppState {
        db: pool,
        jwt: JwtKeys::new(&config.jwt.secret, config.jwt.ttl_days),
        notifier,
        images: ImageStore::new(
            config::load_s3_client(&sdk_config),
            &config.s3,
            config.environment,
        ),
        pricing: PricingPolicy::from_config(&config.pricing),
        admin_email: config.email.admin_email.clone(),
    };

    let app = create_app(
        state,
        &config.cors,
        config.server.max_body_size,
        config.environment,
    )?;

    Ok((app, worker))
}

pub fn create_app(
    state: AppState,
    cors_config: &CorsConfig,
    max_body_size: usize,
    environment: Environment,
) -> Result<Router> {
    let allowed_origins: Vec<HeaderValue> = cors_config
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::ConfigError(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_origin(allowed_origins);

    let mut api = routes::create_router(state.clone());
    if environment.is_development() {
        api = api.layer(middleware::map_response(expose_error_detail));
    }

    let app = Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}
