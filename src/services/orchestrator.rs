//! Background comic generation.
//!
//! `submit` records a pending task and spawns the pipeline
//! (prompt → image → upload → persist) on the runtime; callers poll
//! `get_status` for progress. The orchestrator never holds the pipeline's
//! join handle, only the task id.

use chrono::{DateTime, Utc};
use garde::Validate;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::db::repository::{ComicRepository, RepositoryError};
use crate::models::comic::{
    ComicRecord, ComicStatusView, ComicTask, GenerateComicRequest, TaskStatus, TransitionError,
};
use crate::services::image_gen::{ImageGenError, ImageGenerator};
use crate::services::prompt::{self, PromptInput};
use crate::services::storage::{object_key, ComicStorage, StorageError};
use crate::services::task_store::TaskStore;

#[derive(Clone)]
pub struct ComicOrchestrator {
    tasks: Arc<dyn TaskStore>,
    images: Arc<dyn ImageGenerator>,
    storage: Arc<dyn ComicStorage>,
    comics: Arc<dyn ComicRepository>,
}

impl ComicOrchestrator {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        images: Arc<dyn ImageGenerator>,
        storage: Arc<dyn ComicStorage>,
        comics: Arc<dyn ComicRepository>,
    ) -> Self {
        Self {
            tasks,
            images,
            storage,
            comics,
        }
    }

    pub fn images(&self) -> &dyn ImageGenerator {
        self.images.as_ref()
    }

    pub fn storage(&self) -> &dyn ComicStorage {
        self.storage.as_ref()
    }

    pub fn records(&self) -> &dyn ComicRepository {
        self.comics.as_ref()
    }

    /// Validate the request, record a pending task and start its pipeline
    /// in the background. Returns without waiting for any pipeline work.
    pub async fn submit(&self, request: GenerateComicRequest) -> Result<ComicTask, OrchestratorError> {
        request
            .validate()
            .map_err(|e| OrchestratorError::Validation(e.to_string()))?;
        if request.content.trim().is_empty() {
            return Err(OrchestratorError::Validation(
                "content: must not be blank".to_string(),
            ));
        }

        let task = ComicTask::new(Uuid::new_v4());
        self.tasks.put(task.clone()).await;

        metrics::counter!("comic_jobs_total").increment(1);
        metrics::gauge!("comic_jobs_in_flight").increment(1.0);

        tracing::info!(
            comic_id = %task.id,
            diary_id = %request.diary_id,
            style = %request.style,
            "Comic generation submitted"
        );

        let this = self.clone();
        let task_id = task.id;
        tokio::spawn(async move {
            this.run_pipeline(task_id, request).await;
        });

        Ok(task)
    }

    /// Current view of a comic: the in-memory task merged with its durable record.
    pub async fn get_status(&self, id: &str) -> Result<ComicStatusView, OrchestratorError> {
        let comic_id =
            Uuid::parse_str(id).map_err(|_| OrchestratorError::NotFound(id.to_string()))?;

        let task = self.tasks.get(comic_id).await;

        // Records only exist for completed pipelines.
        let record = match &task {
            Some(t) if t.status != TaskStatus::Completed => None,
            _ => self.comics.find_by_id(comic_id).await?,
        };

        ComicStatusView::merge(task.as_ref(), record.as_ref())
            .ok_or_else(|| OrchestratorError::NotFound(id.to_string()))
    }

    async fn run_pipeline(&self, task_id: Uuid, request: GenerateComicRequest) {
        let start = Instant::now();

        let created_at = match self.transition(task_id, ComicTask::start).await {
            Some(task) if task.status == TaskStatus::Processing => task.created_at,
            _ => {
                tracing::warn!(comic_id = %task_id, "Task could not enter processing, pipeline skipped");
                metrics::gauge!("comic_jobs_in_flight").decrement(1.0);
                return;
            }
        };

        match self.execute(task_id, created_at, &request).await {
            Ok(record) => {
                self.transition(task_id, move |t| t.complete(record)).await;
                metrics::counter!("comic_jobs_completed").increment(1);
                tracing::info!(
                    comic_id = %task_id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Comic generation completed"
                );
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(comic_id = %task_id, stage = e.stage(), error = %message, "Comic generation failed");
                self.transition(task_id, move |t| t.fail(message)).await;
                metrics::counter!("comic_jobs_failed").increment(1);
            }
        }

        metrics::gauge!("comic_jobs_in_flight").decrement(1.0);
        metrics::histogram!("comic_pipeline_seconds").record(start.elapsed().as_secs_f64());
    }

    async fn execute(
        &self,
        task_id: Uuid,
        created_at: DateTime<Utc>,
        request: &GenerateComicRequest,
    ) -> Result<ComicRecord, PipelineError> {
        let prompt = prompt::build_prompt(&PromptInput::from(request));
        tracing::debug!(comic_id = %task_id, stage = "prompt", prompt_chars = prompt.chars().count(), "Prompt built");

        let image = self.images.generate(&prompt).await?;
        tracing::debug!(comic_id = %task_id, stage = "image", "Image generated");

        let image_url = self.storage.upload(task_id, image).await?;
        tracing::debug!(comic_id = %task_id, stage = "upload", image_url = %image_url, "Image stored");

        let completed_at = Utc::now().max(created_at);
        let record = ComicRecord {
            id: task_id,
            diary_id: request.diary_id.clone(),
            user_id: request.user_id.clone(),
            title: prompt::resolve_title(request.title.as_deref()),
            description: prompt,
            image_url,
            style: request.style,
            status: TaskStatus::Completed,
            created_at,
            completed_at: Some(completed_at),
        };
        if let Err(e) = self.comics.save(&record).await {
            self.discard_upload(task_id).await;
            return Err(e.into());
        }
        tracing::debug!(comic_id = %task_id, stage = "persist", "Comic record saved");

        Ok(record)
    }

    /// Remove an image whose record could not be saved.
    async fn discard_upload(&self, task_id: Uuid) {
        let key = object_key(task_id);
        match self.storage.remove(task_id).await {
            Ok(()) => {
                tracing::info!(comic_id = %task_id, object_key = %key, "Removed image for unsaved comic")
            }
            Err(e) => tracing::warn!(
                comic_id = %task_id,
                object_key = %key,
                error = %e,
                "Orphaned comic image left in storage"
            ),
        }
    }

    async fn transition<F>(&self, task_id: Uuid, apply: F) -> Option<ComicTask>
    where
        F: FnOnce(&mut ComicTask) -> Result<(), TransitionError> + Send + 'static,
    {
        self.tasks
            .update(
                task_id,
                Box::new(move |task: &mut ComicTask| {
                    if let Err(e) = apply(task) {
                        tracing::warn!(comic_id = %task.id, error = %e, "Rejected task transition");
                    }
                }),
            )
            .await
    }
}

/// Failure of one pipeline stage. The message becomes the task's error text.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Provider(#[from] ImageGenError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Persistence(#[from] RepositoryError),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Provider(_) => "image",
            PipelineError::Storage(_) => "upload",
            PipelineError::Persistence(_) => "persist",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Comic not found: {0}")]
    NotFound(String),

    #[error("Comic lookup failed: {0}")]
    Lookup(#[from] RepositoryError),
}
