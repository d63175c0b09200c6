use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::queries;
use crate::models::comic::ComicRecord;

/// Durable storage for completed comic records.
#[async_trait]
pub trait ComicRepository: Send + Sync {
    async fn save(&self, record: &ComicRecord) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ComicRecord>, RepositoryError>;

    /// Connectivity check used by the health endpoint.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// PostgreSQL-backed comic repository.
pub struct PgComicRepository {
    pool: PgPool,
}

impl PgComicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ComicRepository for PgComicRepository {
    async fn save(&self, record: &ComicRecord) -> Result<(), RepositoryError> {
        let rows = queries::insert_comic(&self.pool, record).await?;
        if rows == 0 {
            return Err(RepositoryError::NotConfirmed(record.id));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ComicRecord>, RepositoryError> {
        Ok(queries::get_comic(&self.pool, id).await?)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Degraded repository used when no database is configured.
pub struct NoopComicRepository;

#[async_trait]
impl ComicRepository for NoopComicRepository {
    async fn save(&self, record: &ComicRecord) -> Result<(), RepositoryError> {
        tracing::debug!(comic_id = %record.id, "No database configured, skipping comic record");
        Ok(())
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<ComicRecord>, RepositoryError> {
        Ok(None)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database did not confirm write for comic {0}")]
    NotConfirmed(Uuid),
}
