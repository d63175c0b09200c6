use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use comic_diary_server::app_state::AppState;
use comic_diary_server::config::AppConfig;
use comic_diary_server::routes;

#[tokio::main]
async fn main() {
    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    // Initialize logging: readable in debug, structured JSON otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.debug {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    }

    tracing::info!(app_name = %config.app_name, "Initializing comic diary server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!("comic_jobs_total", "Total comic generation jobs submitted");
    metrics::describe_counter!(
        "comic_jobs_completed",
        "Total comic generation jobs completed"
    );
    metrics::describe_counter!(
        "comic_jobs_failed",
        "Total comic generation jobs that failed"
    );
    metrics::describe_gauge!(
        "comic_jobs_in_flight",
        "Comic generation jobs currently pending or processing"
    );
    metrics::describe_histogram!(
        "comic_pipeline_seconds",
        "Time to run a comic generation pipeline"
    );

    let bind_addr = config.bind_addr();

    // Select service implementations and build shared state
    let state = AppState::from_config(config)
        .await
        .expect("Failed to initialize services");

    let app = routes::router(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(1024 * 1024)); // 1 MB limit

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
