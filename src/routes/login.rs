use axum::{Extension, Json, extract::State};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{ApiResponse, AuthResponse, LoginRequest, UserProfile, normalize_email},
    queries::user_queries,
    utils::{extractors::{JsonBody, extract_user_id}, jwt::Claims, password},
};

const BAD_CREDENTIALS: &str = "Incorrect email or password";

pub async fn login_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let user = user_queries::find_by_email(&state.db, &normalize_email(&email))
        .await?
        .ok_or_else(|| AppError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

    if !password::verify_password(password, user.password.clone()).await? {
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let token = state.jwt.generate_token(&user)?;

    Ok(Json(ApiResponse::new(AuthResponse::new(user, token))))
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let user_id = extract_user_id(&claims)?;

    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::new(UserProfile::from(user))))
}
