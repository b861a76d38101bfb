//! Memory Vault Service — standalone binary for storing and recognizing
//! personal memories (text, images, audio, voice profiles).
//!
//! Hosts the JSON API, stored media and a dashboard UI on the same port.
//! Default: http://127.0.0.1:5000/

mod blobs;
mod config;
mod dashboard;
mod db;
mod matching;
mod routes;
mod voice;

use config::ServiceConfig;
use routes::AppState;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = ServiceConfig::from_env();

    log::info!("Opening database at: {}", config.db_path);
    let database = Arc::new(db::Db::open(&config.db_path).expect("Failed to open database"));

    let blob_store = Arc::new(
        blobs::BlobStore::open(&config.image_dir, &config.audio_dir)
            .expect("Failed to create media directories"),
    );
    log::info!(
        "Media directories: images={} audio={}",
        blob_store.image_dir().display(),
        blob_store.audio_dir().display()
    );

    let state = Arc::new(AppState {
        db: database,
        blobs: blob_store,
        start_time: Instant::now(),
    });

    let app = routes::build_router(state, config.max_body_bytes);

    let addr = config.bind_addr();
    log::info!("Memory Vault Service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
