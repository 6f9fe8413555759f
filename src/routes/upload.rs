use axum::{
    Json,
    extract::{Multipart, State},
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::UploadResponse,
    services::image_service::{MAX_IMAGE_BYTES, image_extension},
};

const IMAGE_FIELD: &str = "image";

pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if image_extension(&content_type).is_none() {
            return Err(AppError::BadRequest(
                "Only JPEG, PNG and WebP images are allowed".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read image: {}", e)))?;

        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded image is empty".to_string()));
        }
        if data.len() > MAX_IMAGE_BYTES {
            return Err(AppError::BadRequest(
                "Image must not exceed 5 MB".to_string(),
            ));
        }

        let url = state.images.put_image(data.to_vec(), &content_type).await?;
        return Ok(Json(UploadResponse::new(url)));
    }

    Err(AppError::BadRequest("No image file provided".to_string()))
}
