//! Axum route handlers for the memory vault HTTP API.

use crate::blobs::{BlobKind, BlobStore};
use crate::dashboard;
use crate::db::{Db, NewMemory};
use crate::matching::{self, SpeakerRecognition};
use crate::voice;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, get, post};
use memory_vault_types::*;
use std::sync::Arc;
use std::time::Instant;
use tower_http::services::ServeDir;

const DEFAULT_MEMORY_NAME: &str = "Unnamed Memory";
const SERVICE_NAME: &str = "Memory Vault";

pub struct AppState {
    pub db: Arc<Db>,
    pub blobs: Arc<BlobStore>,
    pub start_time: Instant,
}

pub fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    let cors = tower_http::cors::CorsLayer::permissive();
    let images = ServeDir::new(state.blobs.image_dir());
    let audio = ServeDir::new(state.blobs.audio_dir());

    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/health", get(health))
        .route("/rpc/status", get(status))
        // Memories
        .route("/api/memory/save", post(save_memory))
        .route("/api/memory/list", get(list_memories))
        .route("/api/memory/search", get(search_memories))
        .route("/api/memory/delete/:id", delete(delete_memory))
        .route("/api/memory/recognize", post(recognize_memory))
        .nest_service("/api/memory/image", images)
        .nest_service("/api/memory/audio", audio)
        // Voice profiles
        .route("/api/voice/save", post(save_voice_profile))
        .route("/api/voice/recognize", post(recognize_voice))
        // User profile
        .route("/api/user/profile", get(get_profile).post(save_profile))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

// =====================================================
// Memory Endpoints
// =====================================================

// POST /api/memory/save
pub async fn save_memory(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveMemoryRequest>,
) -> (StatusCode, Json<RpcResponse<SavedMemory>>) {
    let text = non_empty(req.text);
    let image = non_empty(req.image);
    let audio = non_empty(req.audio);
    let name = req
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MEMORY_NAME.to_string());
    let kind = MemoryKind::from_payloads(image.is_some(), text.is_some(), audio.is_some());

    let new = NewMemory {
        kind,
        content: text,
        name: name.clone(),
        metadata: req
            .metadata
            .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        // An empty payload is the same as none
        recognition_data: req.recognition_data.filter(|d| !d.is_empty()),
        voice_data: req.voice_data.filter(|d| !d.is_empty()),
    };

    let id = match state.db.insert_memory(&new) {
        Ok(id) => id,
        Err(e) => {
            log::error!("Failed to save memory: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RpcResponse::err(format!("Error saving memory: {}", e))),
            );
        }
    };

    // Media failures leave the base record in place
    let image_path = image.and_then(|payload| attach_blob(&state, BlobKind::Image, &payload, id));
    let audio_path = audio.and_then(|payload| attach_blob(&state, BlobKind::Audio, &payload, id));

    log::info!("Saved {} memory #{} ({})", kind.as_str(), id, name);
    (
        StatusCode::CREATED,
        Json(RpcResponse::ok(SavedMemory {
            memory_id: id,
            name,
            kind,
            image_path,
            audio_path,
        })),
    )
}

fn attach_blob(state: &AppState, kind: BlobKind, payload: &str, id: i64) -> Option<String> {
    let stored = match kind {
        BlobKind::Image => state.blobs.store_image(payload, id),
        BlobKind::Audio => state.blobs.store_audio(payload, id),
    };
    let file_name = match stored {
        Ok(name) => name,
        Err(e) => {
            log::warn!("Skipping {:?} for memory #{}: {}", kind, id, e);
            return None;
        }
    };

    let updated = match kind {
        BlobKind::Image => state.db.set_image_path(id, &file_name),
        BlobKind::Audio => state.db.set_audio_path(id, &file_name),
    };
    match updated {
        Ok(_) => Some(file_name),
        Err(e) => {
            log::error!("Failed to record {:?} path for memory #{}: {}", kind, id, e);
            state.blobs.remove(kind, &file_name);
            None
        }
    }
}

// GET /api/memory/list
pub async fn list_memories(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<MemoryList>>) {
    match state.db.list_memories() {
        Ok(memories) => (
            StatusCode::OK,
            Json(RpcResponse::ok(MemoryList {
                count: memories.len(),
                memories,
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Error retrieving memories: {}", e))),
        ),
    }
}

// GET /api/memory/search?query=
pub async fn search_memories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> (StatusCode, Json<RpcResponse<SearchResults>>) {
    let Some(query) = non_empty(params.query) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(RpcResponse::err("Query parameter is required")),
        );
    };

    match state.db.search_memories(&query) {
        Ok(memories) => (
            StatusCode::OK,
            Json(RpcResponse::ok(SearchResults {
                count: memories.len(),
                query,
                memories,
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Error searching memories: {}", e))),
        ),
    }
}

// DELETE /api/memory/delete/:id
pub async fn delete_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> (StatusCode, Json<RpcResponse<DeletedMemory>>) {
    match state.db.delete_memory(id) {
        Ok(Some(blobs)) => {
            if let Some(path) = blobs.image_path {
                state.blobs.remove(BlobKind::Image, &path);
            }
            if let Some(path) = blobs.audio_path {
                state.blobs.remove(BlobKind::Audio, &path);
            }
            (StatusCode::OK, Json(RpcResponse::ok(DeletedMemory { memory_id: id })))
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(RpcResponse::err(format!("Memory #{} not found", id))),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Error deleting memory: {}", e))),
        ),
    }
}

// POST /api/memory/recognize
pub async fn recognize_memory(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecognizeRequest>,
) -> (StatusCode, Json<RpcResponse<RecognitionResult>>) {
    let Some(description) = non_empty(req.description) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(RpcResponse::err(matching::MatchError::EmptyQuery.to_string())),
        );
    };

    let candidates = match state.db.recognition_candidates() {
        Ok(c) => c,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RpcResponse::err(format!("Error recognizing memory: {}", e))),
            );
        }
    };

    let ranked = match matching::match_description(&description, &candidates) {
        Ok(r) => r,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(RpcResponse::err(e.to_string()))),
    };

    let result = match ranked.best() {
        Some(best) => RecognitionResult {
            found: true,
            name: Some(best.name.clone()),
            similarity: Some(best.similarity),
            memory_id: Some(best.id),
            all_matches: ranked.top.clone(),
            message: None,
        },
        None => RecognitionResult {
            found: false,
            name: None,
            similarity: None,
            memory_id: None,
            all_matches: Vec::new(),
            message: Some("No matching memory found".to_string()),
        },
    };
    log::debug!(
        "Recognition over {} candidates: {} matches",
        candidates.len(),
        ranked.total_matches
    );
    (StatusCode::OK, Json(RpcResponse::ok(result)))
}

// =====================================================
// Voice Endpoints
// =====================================================

// POST /api/voice/save
pub async fn save_voice_profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveVoiceRequest>,
) -> (StatusCode, Json<RpcResponse<SavedVoiceProfile>>) {
    if req.name.is_empty() || req.speech_sample.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(RpcResponse::err("Name and speech sample are required")),
        );
    }

    let new = NewMemory {
        kind: MemoryKind::Text,
        content: Some(format!("Voice profile: {}", req.name)),
        name: req.name.clone(),
        metadata: serde_json::Value::Object(Default::default()),
        recognition_data: None,
        voice_data: Some(voice::build_voice_data(&req.speech_sample, chrono::Utc::now())),
    };

    match state.db.insert_memory(&new) {
        Ok(id) => {
            log::info!("Saved voice profile #{} for {}", id, req.name);
            (
                StatusCode::CREATED,
                Json(RpcResponse::ok(SavedVoiceProfile {
                    memory_id: id,
                    name: req.name,
                })),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Error saving voice profile: {}", e))),
        ),
    }
}

// POST /api/voice/recognize
pub async fn recognize_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecognizeVoiceRequest>,
) -> (StatusCode, Json<RpcResponse<VoiceRecognitionResult>>) {
    let Some(sample) = non_empty(req.speech_sample) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(RpcResponse::err(matching::MatchError::EmptySample.to_string())),
        );
    };

    let profiles = match state.db.voice_candidates() {
        Ok(p) => p,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RpcResponse::err(format!("Error recognizing voice: {}", e))),
            );
        }
    };

    let outcome = match matching::match_speaker(&sample, &profiles) {
        Ok(o) => o,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(RpcResponse::err(e.to_string()))),
    };

    let not_found = |message: &str| VoiceRecognitionResult {
        found: false,
        name: None,
        similarity: None,
        memory_id: None,
        confidence: None,
        message: Some(message.to_string()),
    };
    let result = match outcome {
        SpeakerRecognition::NoProfiles => not_found("No voice profiles found"),
        SpeakerRecognition::NotRecognized => not_found("Speaker not recognized"),
        SpeakerRecognition::Recognized(m) => VoiceRecognitionResult {
            found: true,
            name: Some(m.name),
            similarity: Some(m.similarity),
            memory_id: Some(m.id),
            confidence: Some(m.confidence),
            message: None,
        },
    };
    (StatusCode::OK, Json(RpcResponse::ok(result)))
}

// =====================================================
// User Profile Endpoints
// =====================================================

// GET /api/user/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<Option<UserProfile>>>) {
    match state.db.get_profile() {
        Ok(p) => (StatusCode::OK, Json(RpcResponse::ok(p))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Error retrieving profile: {}", e))),
        ),
    }
}

// POST /api/user/profile
pub async fn save_profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveProfileRequest>,
) -> (StatusCode, Json<RpcResponse<UserProfile>>) {
    let profile = UserProfile {
        name: req.name,
        interests: req.interests,
        goals: req.goals,
        skill_level: req.skill_level,
        business_type: req.business_type,
        preferred_language: req.preferred_language,
        personality_type: req.personality_type,
        last_updated: None,
    };
    match state.db.replace_profile(&profile) {
        Ok(p) => (StatusCode::OK, Json(RpcResponse::ok(p))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Error saving profile: {}", e))),
        ),
    }
}

// =====================================================
// Service Endpoints
// =====================================================

// GET /health
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// GET /rpc/status
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<ServiceStatus>>) {
    let stats = state.db.get_stats().ok();
    (
        StatusCode::OK,
        Json(RpcResponse::ok(ServiceStatus {
            running: true,
            uptime_secs: state.start_time.elapsed().as_secs(),
            total_memories: stats.as_ref().map(|s| s.total_memories).unwrap_or(0),
            recognition_profiles: stats.as_ref().map(|s| s.recognition_profiles).unwrap_or(0),
            voice_profiles: stats.as_ref().map(|s| s.voice_profiles).unwrap_or(0),
            has_user_profile: stats.as_ref().map(|s| s.has_user_profile).unwrap_or(false),
        })),
    )
}
