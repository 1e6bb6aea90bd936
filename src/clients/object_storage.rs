use std::time::Duration;

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use serde::Serialize;
use uuid::Uuid;

use crate::config::StorageConfig;

/// A presigned request the client performs directly against the bucket.
#[derive(Debug, Clone, Serialize)]
pub struct PresignedUpload {
    pub url: String,
    pub method: String,
    pub key: String,
    pub expires_in_seconds: u64,
}

/// S3-backed storage for exercise images.
///
/// The server never proxies image bytes. Uploads and downloads go through
/// presigned URLs; only object keys are stored in the database.
pub struct ObjectStorage {
    client: Client,
    bucket: String,
    key_prefix: String,
    presign_expiry: Duration,
}

impl ObjectStorage {
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        Ok(Self {
            client: Client::new(&aws_config),
            bucket: config.bucket.clone(),
            key_prefix: config.key_prefix.clone(),
            presign_expiry: Duration::from_secs(config.presign_expiry_seconds),
        })
    }

    /// Object key for a new image. Extension is taken from the content type.
    #[must_use]
    pub fn new_image_key(&self, exercise_id: Uuid, content_type: &str) -> String {
        let extension = match content_type {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        };
        format!(
            "{}/{}/{}.{}",
            self.key_prefix,
            exercise_id,
            Uuid::new_v4(),
            extension
        )
    }

    pub async fn presign_put(&self, key: &str, content_type: &str) -> Result<PresignedUpload> {
        let presigning = PresigningConfig::expires_in(self.presign_expiry)
            .context("Invalid presign expiry")?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .context("Failed to presign upload")?;

        Ok(PresignedUpload {
            url: request.uri().to_string(),
            method: "PUT".to_string(),
            key: key.to_string(),
            expires_in_seconds: self.presign_expiry.as_secs(),
        })
    }

    pub async fn presign_get(&self, key: &str) -> Result<String> {
        let presigning = PresigningConfig::expires_in(self.presign_expiry)
            .context("Invalid presign expiry")?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .context("Failed to presign download")?;

        Ok(request.uri().to_string())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("Failed to delete object")?;

        Ok(())
    }
}
