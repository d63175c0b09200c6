use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use reqwest::Client;
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;

/// Edge length of the placeholder comic image, in pixels.
const PLACEHOLDER_SIZE: u32 = 256;

/// Output of an image generator.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedImage {
    /// Hosted asset the uploader has to fetch.
    Url(String),
    /// Encoded image produced locally.
    Bytes(Vec<u8>),
}

/// Produces a comic image for a prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageGenError>;

    /// Whether a real provider is behind this generator.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Client for the OpenAI images API (DALL-E).
pub struct OpenAiImageClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    size: String,
}

#[derive(Deserialize)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiImageClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        size: &str,
        timeout: Duration,
    ) -> Result<Self, ImageGenError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ImageGenError::Http)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            size: size.to_string(),
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageGenError> {
        let url = format!("{}/images/generations", self.base_url);

        let request_body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
            "size": self.size,
            "response_format": "url",
        });

        tracing::debug!(model = %self.model, prompt_chars = prompt.chars().count(), "Requesting image generation");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(ImageGenError::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(ImageGenError::Http)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ImageGenError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ImagesResponse = serde_json::from_str(&body).map_err(ImageGenError::Parse)?;

        parsed
            .data
            .into_iter()
            .find_map(|d| d.url)
            .map(GeneratedImage::Url)
            .ok_or(ImageGenError::EmptyResponse)
    }
}

/// Stand-in generator used when no provider key is configured. Renders a
/// blank PNG locally so storage never has to fetch anything.
#[derive(Debug, Default)]
pub struct PlaceholderImageGenerator;

impl PlaceholderImageGenerator {
    pub fn new() -> Self {
        Self
    }

    fn render() -> Result<Vec<u8>, ImageGenError> {
        let canvas = RgbImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, Rgb([250, 240, 225]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(canvas)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .map_err(|e| ImageGenError::Render(e.to_string()))?;
        Ok(out)
    }
}

#[async_trait]
impl ImageGenerator for PlaceholderImageGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedImage, ImageGenError> {
        Self::render().map(GeneratedImage::Bytes)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageGenError {
    #[error("Image provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Failed to parse image provider response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Image provider returned no image")]
    EmptyResponse,

    #[error("Failed to render placeholder image: {0}")]
    Render(String),
}
