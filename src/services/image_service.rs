use aws_sdk_s3::{Client as S3Client, primitives::ByteStream};
use uuid::Uuid;

use crate::{
    config::{Environment, S3Config},
    error::{AppError, Result},
};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Product image bucket. Objects are public and never expire, so the
/// returned URL can be stored on the product directly.
#[derive(Clone)]
pub struct ImageStore {
    client: S3Client,
    bucket: String,
    public_base_url: String,
    prefix: &'static str,
}

impl ImageStore {
    pub fn new(client: S3Client, config: &S3Config, environment: Environment) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            public_base_url: config.assets_url.clone(),
            prefix: environment.storage_prefix(),
        }
    }

    pub fn object_key(&self, extension: &str) -> String {
        format!("{}/{}.{}", self.prefix, Uuid::new_v4(), extension)
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    pub async fn put_image(&self, data: Vec<u8>, content_type: &str) -> Result<String> {
        let extension = image_extension(content_type).ok_or_else(|| {
            AppError::BadRequest("Only JPEG, PNG and WebP images are allowed".to_string())
        })?;
        let key = self.object_key(extension);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| AppError::InternalError(format!("S3 upload of {} failed: {:?}", key, e)))?;

        tracing::info!("Uploaded image {}", key);
        Ok(self.public_url(&key))
    }
}
