use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::db::{
    self,
    repository::{ComicRepository, NoopComicRepository, PgComicRepository},
};
use crate::services::{
    auth::{AuthError, AuthService},
    image_gen::{ImageGenError, ImageGenerator, OpenAiImageClient, PlaceholderImageGenerator},
    orchestrator::ComicOrchestrator,
    storage::{ComicStorage, PlaceholderStorage, S3ComicStorage, StorageError},
    task_store::InMemoryTaskStore,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub comics: ComicOrchestrator,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(config: AppConfig, comics: ComicOrchestrator, auth: AuthService) -> Self {
        Self {
            config: Arc::new(config),
            comics,
            auth: Arc::new(auth),
        }
    }

    /// Wire up services from configuration. Each optional external service
    /// falls back to its placeholder implementation when unconfigured.
    pub async fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        let images: Arc<dyn ImageGenerator> = match &config.openai_api_key {
            Some(api_key) => {
                tracing::info!(model = %config.image_model, "Using OpenAI image generation");
                Arc::new(OpenAiImageClient::new(
                    &config.image_api_base_url,
                    api_key,
                    &config.image_model,
                    &config.image_size,
                    Duration::from_secs(config.image_timeout_secs),
                )?)
            }
            None => {
                tracing::warn!("OPENAI_API_KEY not set, using placeholder images");
                Arc::new(PlaceholderImageGenerator::new())
            }
        };

        let storage: Arc<dyn ComicStorage> = match (
            &config.storage_endpoint,
            &config.storage_access_key,
            &config.storage_secret_key,
        ) {
            (Some(endpoint), Some(access_key), Some(secret_key)) => {
                tracing::info!(bucket = %config.storage_bucket, "Using S3 object storage");
                Arc::new(S3ComicStorage::new(
                    &config.storage_bucket,
                    &config.storage_region,
                    endpoint,
                    access_key,
                    secret_key,
                    config.storage_public_url.as_deref(),
                    Duration::from_secs(config.storage_timeout_secs),
                )?)
            }
            _ => {
                tracing::warn!("Object storage not configured, using placeholder URLs");
                Arc::new(PlaceholderStorage::new(&config.placeholder_base_url))
            }
        };

        let comics: Arc<dyn ComicRepository> = match &config.database_url {
            Some(database_url) => {
                tracing::info!("Connecting to PostgreSQL database");
                let pool = db::init_pool(database_url).await?;

                tracing::info!("Running database migrations");
                db::run_migrations(&pool).await?;

                Arc::new(PgComicRepository::new(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, comic records will not be persisted");
                Arc::new(NoopComicRepository)
            }
        };

        let auth = AuthService::from_config(&config)?;
        let orchestrator =
            ComicOrchestrator::new(Arc::new(InMemoryTaskStore::new()), images, storage, comics);

        Ok(Self::new(config, orchestrator, auth))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Database setup failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage setup failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Image client setup failed: {0}")]
    ImageGen(#[from] ImageGenError),

    #[error("Auth setup failed: {0}")]
    Auth(#[from] AuthError),
}
