use end_frame_gen::{
    app_state::AppState,
    config::AppConfig,
    models::job::GenerationConfig,
    routes,
    services::{generation::GeminiClient, queue::JobQueue, worker::Worker},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing end-frame-gen server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);
    routes::metrics::describe_metrics();

    // Initialize Gemini client
    tracing::info!(
        model = %config.gemini_model,
        timeout_secs = config.generation_timeout_secs,
        "Initializing Gemini image client"
    );
    let generator = GeminiClient::new(
        &config.gemini_api_base,
        &config.gemini_model,
        &config.api_key,
        Duration::from_secs(config.generation_timeout_secs),
    )
    .expect("Failed to initialize Gemini client");

    // Start the single generation worker
    let queue = Arc::new(JobQueue::new());
    Worker::new(
        Arc::clone(&queue),
        Arc::new(generator),
        GenerationConfig::default(),
    )
    .spawn();

    let state = AppState::new(queue);
    let app = routes::router(state, Some(prometheus_handle), config.max_upload_bytes);

    tracing::info!("Starting end-frame-gen on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, in-flight jobs are dropped");
}
