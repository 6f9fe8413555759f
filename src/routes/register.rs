use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{ApiResponse, AuthResponse, RegisterRequest, UserRole, normalize_email},
    queries::user_queries,
    utils::{extractors::JsonBody, password},
};

pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    payload.validate()?;

    let email = normalize_email(&payload.email);
    let name = payload.name.trim().to_string();

    if user_queries::find_by_email(&state.db, &email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already used".to_string()));
    }

    let password_hash = password::hash_password(payload.password).await?;

    let user =
        user_queries::create_user(&state.db, &email, &name, &password_hash, UserRole::User)
            .await?;

    tracing::info!("Registered user {}", user.id);

    let token = state.jwt.generate_token(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(AuthResponse::new(user, token))),
    ))
}
