//! Shared types for the memory vault service and its HTTP clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =====================================================
// Domain Types
// =====================================================

/// What a memory was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Text,
    Image,
    Audio,
    Mixed,
}

impl MemoryKind {
    /// Derive the kind from the payloads supplied at creation.
    ///
    /// `Mixed` requires both image and text. Otherwise image wins over audio,
    /// and a memory with neither is plain text.
    pub fn from_payloads(has_image: bool, has_text: bool, has_audio: bool) -> Self {
        if has_image && has_text {
            MemoryKind::Mixed
        } else if has_image {
            MemoryKind::Image
        } else if has_audio {
            MemoryKind::Audio
        } else {
            MemoryKind::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Text => "text",
            MemoryKind::Image => "image",
            MemoryKind::Audio => "audio",
            MemoryKind::Mixed => "mixed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(MemoryKind::Text),
            "image" => Some(MemoryKind::Image),
            "audio" => Some(MemoryKind::Audio),
            "mixed" => Some(MemoryKind::Mixed),
            _ => None,
        }
    }
}

/// Recognition payload attached to a memory. Any fields besides
/// `description` are kept as the caller sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecognitionData {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// `{}`: no description and no caller fields.
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageStyle {
    Hinglish,
    #[default]
    English,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechPatterns {
    pub sample_text: String,
    pub word_count: usize,
    pub common_words: Vec<String>,
    pub language_style: LanguageStyle,
}

/// Voice profile payload. Missing pieces deserialize to empty values so a
/// partial profile still loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceData {
    #[serde(default)]
    pub speech_patterns: SpeechPatterns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,
}

impl VoiceData {
    pub fn sample_text(&self) -> &str {
        &self.speech_patterns.sample_text
    }

    pub fn is_empty(&self) -> bool {
        self.recorded_at.is_none() && self.speech_patterns == SpeechPatterns::default()
    }
}

/// A stored memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    pub content: Option<String>,
    pub image_path: Option<String>,
    pub name: String,
    pub created_at: String,
    pub metadata: Value,
    pub recognition_data: Option<RecognitionData>,
    pub voice_data: Option<VoiceData>,
    pub audio_path: Option<String>,
}

/// The single stored user profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub interests: Vec<String>,
    pub goals: Vec<String>,
    pub skill_level: Option<String>,
    pub business_type: Option<String>,
    pub preferred_language: Option<String>,
    pub personality_type: Option<String>,
    pub last_updated: Option<String>,
}

/// Store-wide counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_memories: i64,
    pub recognition_profiles: i64,
    pub voice_profiles: i64,
    pub has_user_profile: bool,
}

// =====================================================
// Request Types
// =====================================================

/// Body of `POST /api/memory/save`. Empty strings count as absent.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveMemoryRequest {
    pub text: Option<String>,
    /// Base64 image, optionally with a `data:` URL prefix.
    pub image: Option<String>,
    /// Base64 audio, optionally with a `data:` URL prefix.
    pub audio: Option<String>,
    pub name: Option<String>,
    pub metadata: Option<Value>,
    pub recognition_data: Option<RecognitionData>,
    pub voice_data: Option<VoiceData>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RecognizeRequest {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveVoiceRequest {
    pub name: String,
    pub speech_sample: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RecognizeVoiceRequest {
    #[serde(default)]
    pub speech_sample: Option<String>,
}

/// Body of `POST /api/user/profile`. Replaces the stored profile wholesale.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveProfileRequest {
    pub name: Option<String>,
    pub interests: Vec<String>,
    pub goals: Vec<String>,
    pub skill_level: Option<String>,
    pub business_type: Option<String>,
    pub preferred_language: Option<String>,
    pub personality_type: Option<String>,
}

// =====================================================
// Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedMemory {
    pub memory_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    pub image_path: Option<String>,
    pub audio_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemoryList {
    pub count: usize,
    pub memories: Vec<MemoryRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResults {
    pub count: usize,
    pub query: String,
    pub memories: Vec<MemoryRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedMemory {
    pub memory_id: i64,
}

/// One ranked candidate from description matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptionMatch {
    pub id: i64,
    pub name: String,
    pub similarity: f64,
    pub recognition_data: Option<RecognitionData>,
    pub image_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_matches: Vec<DescriptionMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoiceRecognitionResult {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedVoiceProfile {
    pub memory_id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// =====================================================
// Service Status
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub total_memories: i64,
    pub recognition_profiles: i64,
    pub voice_profiles: i64,
    pub has_user_profile: bool,
}
