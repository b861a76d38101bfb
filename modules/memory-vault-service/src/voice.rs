//! Speech pattern extraction for voice profile enrollment.

use chrono::{DateTime, Utc};
use memory_vault_types::{LanguageStyle, SpeechPatterns, VoiceData};
use std::collections::HashSet;

/// Cap on distinct words kept in `common_words`.
pub const MAX_COMMON_WORDS: usize = 20;

/// Substrings that mark a sample as Hinglish.
const HINGLISH_MARKERS: [&str; 4] = ["hai", "haan", "nahi", "kya"];

pub fn build_voice_data(sample: &str, now: DateTime<Utc>) -> VoiceData {
    VoiceData {
        speech_patterns: speech_patterns(sample),
        recorded_at: Some(now.to_rfc3339()),
    }
}

pub fn speech_patterns(sample: &str) -> SpeechPatterns {
    let lower = sample.to_lowercase();

    let mut seen = HashSet::new();
    let common_words = lower
        .split_whitespace()
        .filter(|w| seen.insert(*w))
        .take(MAX_COMMON_WORDS)
        .map(str::to_string)
        .collect();

    SpeechPatterns {
        sample_text: sample.to_string(),
        word_count: sample.split_whitespace().count(),
        common_words,
        language_style: detect_language_style(&lower),
    }
}

/// Substring check, so "chair" counts as containing "hai".
fn detect_language_style(lower: &str) -> LanguageStyle {
    if HINGLISH_MARKERS.iter().any(|m| lower.contains(m)) {
        LanguageStyle::Hinglish
    } else {
        LanguageStyle::English
    }
}
