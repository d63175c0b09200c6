use async_trait::async_trait;
use image::ImageFormat;
use reqwest::Client;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use std::io::Cursor;
use std::time::Duration;
use uuid::Uuid;

use crate::services::image_gen::GeneratedImage;

/// Largest generated asset accepted from the image provider.
pub const MAX_ASSET_BYTES: usize = 20 * 1024 * 1024;

/// Re-hosts generated comic images under a stable, task-derived key.
#[async_trait]
pub trait ComicStorage: Send + Sync {
    /// Store the generated image for `comic_id`, returning the public URL.
    /// URL sources are fetched first.
    async fn upload(&self, comic_id: Uuid, image: GeneratedImage) -> Result<String, StorageError>;

    /// Remove whatever `upload` stored for `comic_id`.
    async fn remove(&self, _comic_id: Uuid) -> Result<(), StorageError> {
        Ok(())
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// Object key for a comic image.
pub fn object_key(comic_id: Uuid) -> String {
    format!("comics/{}.png", comic_id)
}

/// S3-compatible object storage (R2, Supabase Storage, MinIO).
pub struct S3ComicStorage {
    bucket: Box<Bucket>,
    http: Client,
    public_base_url: String,
}

impl S3ComicStorage {
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        public_base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: region.to_string(),
            endpoint: endpoint.to_string(),
        };

        let credentials =
            Credentials::new(Some(access_key), Some(secret_key), None, None, None)
                .map_err(|e| StorageError::Config(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?
            .with_path_style();

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(StorageError::Fetch)?;

        let public_base_url = match public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}/{}", endpoint.trim_end_matches('/'), bucket_name),
        };

        Ok(Self {
            bucket,
            http,
            public_base_url,
        })
    }

    async fn fetch(&self, source_url: &str) -> Result<Vec<u8>, StorageError> {
        fetch_limited(&self.http, source_url, MAX_ASSET_BYTES).await
    }

    /// Download a stored comic image.
    pub async fn download(&self, comic_id: Uuid) -> Result<Vec<u8>, StorageError> {
        let response = self
            .bucket
            .get_object(object_key(comic_id))
            .await
            .map_err(StorageError::S3)?;
        Ok(response.to_vec())
    }
}

#[async_trait]
impl ComicStorage for S3ComicStorage {
    async fn upload(&self, comic_id: Uuid, image: GeneratedImage) -> Result<String, StorageError> {
        let raw = match image {
            GeneratedImage::Url(source_url) => {
                let raw = self.fetch(&source_url).await?;
                tracing::debug!(comic_id = %comic_id, bytes = raw.len(), "Fetched generated image");
                raw
            }
            GeneratedImage::Bytes(raw) => raw,
        };

        let png = tokio::task::spawn_blocking(move || normalize_to_png(raw))
            .await
            .map_err(|e| StorageError::Transcode(e.to_string()))??;

        let key = object_key(comic_id);
        let response = self
            .bucket
            .put_object_with_content_type(&key, &png, "image/png")
            .await
            .map_err(StorageError::S3)?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::UploadStatus(status));
        }

        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn remove(&self, comic_id: Uuid) -> Result<(), StorageError> {
        self.bucket
            .delete_object(object_key(comic_id))
            .await
            .map_err(StorageError::S3)?;
        Ok(())
    }
}

/// Degraded storage: nothing is fetched or written, a deterministic URL is returned.
pub struct PlaceholderStorage {
    base_url: String,
}

impl PlaceholderStorage {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ComicStorage for PlaceholderStorage {
    async fn upload(&self, comic_id: Uuid, _image: GeneratedImage) -> Result<String, StorageError> {
        Ok(format!("{}/{}.png", self.base_url, comic_id))
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// GET `url`, refusing bodies larger than `limit` bytes.
async fn fetch_limited(http: &Client, url: &str, limit: usize) -> Result<Vec<u8>, StorageError> {
    let mut response = http.get(url).send().await.map_err(StorageError::Fetch)?;

    let status = response.status();
    if !status.is_success() {
        return Err(StorageError::FetchStatus(status.as_u16()));
    }

    if let Some(length) = response.content_length() {
        if length > limit as u64 {
            return Err(StorageError::TooLarge(limit));
        }
    }

    // Content-Length can be absent or wrong, so the cap also applies while reading.
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(StorageError::Fetch)? {
        if body.len() + chunk.len() > limit {
            return Err(StorageError::TooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Re-encode an image as PNG. PNG input is returned untouched.
pub fn normalize_to_png(bytes: Vec<u8>) -> Result<Vec<u8>, StorageError> {
    let format = image::guess_format(&bytes).map_err(|_| StorageError::UnsupportedFormat)?;
    if format == ImageFormat::Png {
        return Ok(bytes);
    }

    let decoded = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| StorageError::Transcode(e.to_string()))?;

    let mut out = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| StorageError::Transcode(e.to_string()))?;
    Ok(out)
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to fetch generated image: {0}")]
    Fetch(#[source] reqwest::Error),

    #[error("Generated image URL returned status {0}")]
    FetchStatus(u16),

    #[error("Generated image exceeds {0} bytes")]
    TooLarge(usize),

    #[error("Generated asset is not a supported image format")]
    UnsupportedFormat,

    #[error("Failed to convert image to PNG: {0}")]
    Transcode(String),

    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("Object store rejected upload with status {0}")]
    UploadStatus(u16),

    #[error("Storage configuration error: {0}")]
    Config(String),
}
