//! In-process API tests
//!
//! Drive the router directly with fake or placeholder external services.
//! Run with: cargo test --test api_test

mod helpers;

use axum::http::StatusCode;
use chrono::Utc;
use helpers::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

use comic_diary_server::{
    db::repository::NoopComicRepository,
    models::comic::{ComicRecord, ComicStyle, TaskStatus},
    services::{image_gen::PlaceholderImageGenerator, storage::PlaceholderStorage},
};

const POLL_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_health_check() {
    let app = degraded_app();
    let (status, body) = send(&app, "GET", "/api/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "Comic Diary AI Server");
    assert!(body["timestamp"].is_string());
    assert_eq!(body["checks"]["database"]["status"], "disabled");
    assert_eq!(body["checks"]["storage"]["status"], "placeholder");
    assert_eq!(body["checks"]["image_provider"]["status"], "placeholder");
}

#[tokio::test]
async fn test_root_endpoint() {
    let app = degraded_app();
    let (status, body) = send(&app, "GET", "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_login_with_stub_credentials() {
    let app = degraded_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        Some(json!({ "email": "test@example.com", "password": "password" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "bearer");
    assert!(!body["accessToken"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = degraded_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        Some(json!({ "email": "test@example.com", "password": "wrong" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_without_body_is_validation_error() {
    let app = degraded_app();
    let (status, _) = send(&app, "POST", "/api/v1/auth/login", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_logout() {
    let app = degraded_app();
    let (status, body) = send(&app, "POST", "/api/v1/auth/logout", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully logged out");
}

#[tokio::test]
async fn test_generate_and_poll_in_degraded_mode() {
    let gate = Arc::new(Notify::new());
    let app = app_with(
        Arc::new(GatedGenerator { gate: gate.clone() }),
        Arc::new(PlaceholderStorage::new(PLACEHOLDER_BASE)),
        Arc::new(NoopComicRepository),
    );

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/comic/generate",
        Some(json!({ "diaryId": "d1", "content": "Went to the park today", "style": "cute" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["estimatedTimeSeconds"], 60);
    let comic_id = body["comicId"].as_str().unwrap().to_string();

    // Pipeline is held at the image step
    let (status, body) = send(&app, "GET", &format!("/api/v1/comic/{}", comic_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(matches!(body["status"].as_str(), Some("pending") | Some("processing")));
    assert_eq!(body["imageUrl"], "");

    gate.notify_one();
    let done = poll_comic_status(&app, &comic_id, POLL_TIMEOUT).await;

    assert_eq!(done["status"], "completed");
    assert_eq!(
        done["imageUrl"],
        format!("{}/{}.png", PLACEHOLDER_BASE, comic_id)
    );
    assert!(done["errorMessage"].is_null());
}

#[tokio::test]
async fn test_completed_comic_includes_record_fields() {
    let repo = Arc::new(MemoryRepository::default());
    let app = app_with(
        Arc::new(PlaceholderImageGenerator::new()),
        Arc::new(PlaceholderStorage::new("https://cdn.example.com/comics")),
        repo.clone(),
    );

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/comic/generate",
        Some(json!({
            "diaryId": "diary-42",
            "content": "Made kimchi with grandma",
            "title": "Kimchi Day",
            "mood": "happy",
            "style": "emotional",
            "userId": "user-7"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let comic_id = body["comicId"].as_str().unwrap().to_string();

    let done = poll_comic_status(&app, &comic_id, POLL_TIMEOUT).await;
    assert_eq!(done["status"], "completed");
    assert_eq!(done["title"], "Kimchi Day");
    assert_eq!(done["style"], "emotional");
    assert_eq!(done["diaryId"], "diary-42");
    assert_eq!(done["userId"], "user-7");
    assert_eq!(
        done["imageUrl"],
        format!("https://cdn.example.com/comics/{}.png", comic_id)
    );

    let id = Uuid::parse_str(&comic_id).unwrap();
    assert!(repo.records.lock().await.contains_key(&id));
}

#[tokio::test]
async fn test_provider_failure_reported_on_poll() {
    let repo = Arc::new(MemoryRepository::default());
    let app = app_with(
        Arc::new(RejectingGenerator),
        Arc::new(PlaceholderStorage::new(PLACEHOLDER_BASE)),
        repo.clone(),
    );

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/comic/generate",
        Some(json!({ "diaryId": "d1", "content": "Something the provider dislikes" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    let comic_id = body["comicId"].as_str().unwrap().to_string();

    let done = poll_comic_status(&app, &comic_id, POLL_TIMEOUT).await;
    assert_eq!(done["status"], "failed");
    assert!(done["errorMessage"]
        .as_str()
        .unwrap()
        .contains("rejected by the safety system"));
    assert!(repo.records.lock().await.is_empty());
}

#[tokio::test]
async fn test_generate_validation_errors() {
    let app = degraded_app();

    let (status, _) = send(&app, "POST", "/api/v1/comic/generate", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/comic/generate",
        Some(json!({ "content": "missing diary id" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/comic/generate",
        Some(json!({ "diaryId": "d1", "content": "hi", "style": "noir" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/comic/generate",
        Some(json!({ "diaryId": "d1", "content": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("content"));
}

#[tokio::test]
async fn test_unknown_comic_is_not_found() {
    let app = degraded_app();

    let (status, _) = send(&app, "GET", "/api/v1/comic/unknown-id", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", &format!("/api/v1/comic/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lookup_failure_is_server_error() {
    let app = app_with(
        Arc::new(PlaceholderImageGenerator::new()),
        Arc::new(PlaceholderStorage::new(PLACEHOLDER_BASE)),
        Arc::new(BrokenRepository),
    );

    let (status, body) = send(&app, "GET", &format!("/api/v1/comic/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("lookup failed"));
}

#[tokio::test]
async fn test_persisted_comic_served_without_task() {
    let repo = Arc::new(MemoryRepository::default());
    let record = ComicRecord {
        id: Uuid::new_v4(),
        diary_id: "d9".to_string(),
        user_id: None,
        title: "Before restart".to_string(),
        description: "prompt".to_string(),
        image_url: "https://cdn.example.com/comics/old.png".to_string(),
        style: ComicStyle::Comic,
        status: TaskStatus::Completed,
        created_at: Utc::now(),
        completed_at: Some(Utc::now()),
    };
    repo.records.lock().await.insert(record.id, record.clone());

    let app = app_with(
        Arc::new(PlaceholderImageGenerator::new()),
        Arc::new(PlaceholderStorage::new(PLACEHOLDER_BASE)),
        repo,
    );

    let (status, body) = send(&app, "GET", &format!("/api/v1/comic/{}", record.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["title"], "Before restart");
    assert_eq!(body["style"], "comic");
}

#[tokio::test]
async fn test_concurrent_submissions_get_distinct_ids() {
    let app = degraded_app();

    let submissions = (0..10).map(|i| {
        let app = app.clone();
        async move {
            let (status, body) = send(
                &app,
                "POST",
                "/api/v1/comic/generate",
                Some(json!({ "diaryId": format!("d{}", i), "content": "busy day" })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            body["comicId"].as_str().unwrap().to_string()
        }
    });
    let mut ids = futures::future::join_all(submissions).await;

    for id in &ids {
        let done = poll_comic_status(&app, id, POLL_TIMEOUT).await;
        assert_eq!(done["status"], "completed");
    }

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}
