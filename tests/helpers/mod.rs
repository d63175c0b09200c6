//! Test helper utilities for in-process API testing

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::sleep;
use tower::ServiceExt;
use uuid::Uuid;

use comic_diary_server::{
    app_state::AppState,
    config::AppConfig,
    db::repository::{ComicRepository, NoopComicRepository, RepositoryError},
    models::comic::ComicRecord,
    routes,
    services::{
        auth::AuthService,
        image_gen::{GeneratedImage, ImageGenError, ImageGenerator, PlaceholderImageGenerator},
        orchestrator::ComicOrchestrator,
        storage::{ComicStorage, PlaceholderStorage},
        task_store::InMemoryTaskStore,
    },
};

pub const PLACEHOLDER_BASE: &str = "https://via.placeholder.com/comics";

/// Image provider that always rejects the prompt.
pub struct RejectingGenerator;

#[async_trait]
impl ImageGenerator for RejectingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedImage, ImageGenError> {
        Err(ImageGenError::Provider {
            status: 400,
            message: "Your request was rejected by the safety system".to_string(),
        })
    }
}

/// Image provider that waits for the test to release it.
pub struct GatedGenerator {
    pub gate: Arc<Notify>,
}

#[async_trait]
impl ImageGenerator for GatedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedImage, ImageGenError> {
        self.gate.notified().await;
        Ok(GeneratedImage::Url(
            "https://images.example.com/generated.png".to_string(),
        ))
    }
}

/// Repository that keeps records in memory.
#[derive(Default)]
pub struct MemoryRepository {
    pub records: Mutex<HashMap<Uuid, ComicRecord>>,
}

#[async_trait]
impl ComicRepository for MemoryRepository {
    async fn save(&self, record: &ComicRecord) -> Result<(), RepositoryError> {
        self.records.lock().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ComicRecord>, RepositoryError> {
        Ok(self.records.lock().await.get(&id).cloned())
    }
}

/// Repository whose reads always fail.
pub struct BrokenRepository;

#[async_trait]
impl ComicRepository for BrokenRepository {
    async fn save(&self, _record: &ComicRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<ComicRecord>, RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::from_vars(vec![(
        "PLACEHOLDER_BASE_URL".to_string(),
        PLACEHOLDER_BASE.to_string(),
    )])
    .expect("Failed to build test config")
}

/// Build a router around the given collaborators.
pub fn app_with(
    images: Arc<dyn ImageGenerator>,
    storage: Arc<dyn ComicStorage>,
    comics: Arc<dyn ComicRepository>,
) -> Router {
    let config = test_config();
    let auth = AuthService::from_config(&config).expect("Failed to build auth service");
    let orchestrator =
        ComicOrchestrator::new(Arc::new(InMemoryTaskStore::new()), images, storage, comics);
    routes::router(AppState::new(config, orchestrator, auth))
}

/// Router with every external service in placeholder mode.
pub fn degraded_app() -> Router {
    app_with(
        Arc::new(PlaceholderImageGenerator::new()),
        Arc::new(PlaceholderStorage::new(PLACEHOLDER_BASE)),
        Arc::new(NoopComicRepository),
    )
}

/// Send a request and decode the JSON response body.
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Router is infallible");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Poll comic status until completed or failed (with timeout)
pub async fn poll_comic_status(app: &Router, comic_id: &str, timeout: Duration) -> Value {
    let attempts = (timeout.as_millis() / 10).max(1);

    for _ in 0..attempts {
        let (status, body) = send(app, "GET", &format!("/api/v1/comic/{}", comic_id), None).await;
        assert_eq!(status, StatusCode::OK, "status poll failed: {}", body);

        match body["status"].as_str() {
            Some("completed") | Some("failed") => return body,
            Some("pending") | Some("processing") => sleep(Duration::from_millis(10)).await,
            other => panic!("Unknown comic status: {:?}", other),
        }
    }

    panic!("Comic {} did not finish within {:?}", comic_id, timeout);
}
