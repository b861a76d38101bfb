//! Word-overlap matching of descriptions and speech samples against stored
//! memories.
//!
//! Both operations lowercase and split on whitespace into word sets, keep
//! candidates sharing at least [`MIN_COMMON_WORDS`] words, and score them as
//! `|common| / max(|query|, |candidate|)`. Scoring is a pure pass over the
//! snapshot it is given.

use memory_vault_types::{Confidence, DescriptionMatch, MemoryRecord};
use std::collections::HashSet;

/// Candidates sharing fewer words than this are dropped.
pub const MIN_COMMON_WORDS: usize = 2;

/// Number of ranked description matches returned alongside the best one.
pub const TOP_MATCHES: usize = 3;

/// Speaker matches scoring above this are reported with high confidence.
pub const HIGH_CONFIDENCE_SIMILARITY: f64 = 0.5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("Description is required")]
    EmptyQuery,
    #[error("Speech sample is required")]
    EmptySample,
}

/// Result of [`match_description`].
#[derive(Debug, Clone, Default)]
pub struct RankedMatches {
    /// Best-first, at most [`TOP_MATCHES`] long.
    pub top: Vec<DescriptionMatch>,
    /// How many candidates passed the overlap threshold.
    pub total_matches: usize,
}

impl RankedMatches {
    pub fn found(&self) -> bool {
        !self.top.is_empty()
    }

    pub fn best(&self) -> Option<&DescriptionMatch> {
        self.top.first()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerMatch {
    pub id: i64,
    pub name: String,
    pub similarity: f64,
    pub confidence: Confidence,
}

/// Result of [`match_speaker`].
#[derive(Debug, Clone, PartialEq)]
pub enum SpeakerRecognition {
    /// There were no voice profiles to compare against.
    NoProfiles,
    /// Profiles exist but none shared enough words with the sample.
    NotRecognized,
    Recognized(SpeakerMatch),
}

/// Match a free-text description against memories carrying recognition data.
pub fn match_description(
    query: &str,
    candidates: &[MemoryRecord],
) -> Result<RankedMatches, MatchError> {
    if query.is_empty() {
        return Err(MatchError::EmptyQuery);
    }

    let scored = rank(query, candidates, |record| {
        record
            .recognition_data
            .as_ref()
            .map(|r| r.description())
            .unwrap_or("")
    });
    let total_matches = scored.len();

    let top = scored
        .into_iter()
        .take(TOP_MATCHES)
        .map(|(record, similarity)| DescriptionMatch {
            id: record.id,
            name: record.name.clone(),
            similarity,
            recognition_data: record.recognition_data.clone(),
            image_path: record.image_path.clone(),
        })
        .collect();

    Ok(RankedMatches { top, total_matches })
}

/// Match a speech sample against memories carrying voice data.
pub fn match_speaker(
    sample: &str,
    voice_profiles: &[MemoryRecord],
) -> Result<SpeakerRecognition, MatchError> {
    if sample.is_empty() {
        return Err(MatchError::EmptySample);
    }
    if voice_profiles.is_empty() {
        return Ok(SpeakerRecognition::NoProfiles);
    }

    let scored = rank(sample, voice_profiles, |record| {
        record
            .voice_data
            .as_ref()
            .map(|v| v.sample_text())
            .unwrap_or("")
    });

    Ok(match scored.into_iter().next() {
        Some((record, similarity)) => SpeakerRecognition::Recognized(SpeakerMatch {
            id: record.id,
            name: record.name.clone(),
            similarity,
            confidence: confidence_for(similarity),
        }),
        None => SpeakerRecognition::NotRecognized,
    })
}

pub fn confidence_for(similarity: f64) -> Confidence {
    if similarity > HIGH_CONFIDENCE_SIMILARITY {
        Confidence::High
    } else {
        Confidence::Low
    }
}

/// Lowercased, whitespace-split word set. Punctuation stays attached.
pub fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Similarity of two word sets, or `None` if they share too few words.
pub fn overlap_score(query: &HashSet<String>, candidate: &HashSet<String>) -> Option<f64> {
    let common = query.intersection(candidate).count();
    if common < MIN_COMMON_WORDS {
        return None;
    }
    let denom = query.len().max(candidate.len());
    Some(common as f64 / denom as f64)
}

/// Score every candidate and return the matches best-first. Equal scores
/// keep their input order.
fn rank<'a, F>(query: &str, candidates: &'a [MemoryRecord], text_of: F) -> Vec<(&'a MemoryRecord, f64)>
where
    F: Fn(&MemoryRecord) -> &str,
{
    let query_words = word_set(query);
    let mut scored: Vec<(&MemoryRecord, f64)> = candidates
        .iter()
        .filter_map(|record| {
            let words = word_set(text_of(record));
            overlap_score(&query_words, &words).map(|s| (record, s))
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_vault_types::{MemoryKind, RecognitionData, SpeechPatterns, VoiceData};

    fn described(id: i64, name: &str, description: &str) -> MemoryRecord {
        MemoryRecord {
            id,
            kind: MemoryKind::Image,
            content: None,
            image_path: Some(format!("memory_{}.jpg", id)),
            name: name.to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            metadata: serde_json::json!({}),
            recognition_data: Some(RecognitionData {
                description: Some(description.to_string()),
                ..Default::default()
            }),
            voice_data: None,
            audio_path: None,
        }
    }

    fn voiced(id: i64, name: &str, sample: &str) -> MemoryRecord {
        MemoryRecord {
            id,
            kind: MemoryKind::Text,
            content: Some(format!("Voice profile: {}", name)),
            image_path: None,
            name: name.to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            metadata: serde_json::json!({}),
            recognition_data: None,
            voice_data: Some(VoiceData {
                speech_patterns: SpeechPatterns {
                    sample_text: sample.to_string(),
                    ..Default::default()
                },
                recorded_at: None,
            }),
            audio_path: None,
        }
    }

    #[test]
    fn test_empty_query_is_rejected() {
        let candidates = vec![described(1, "a", "red umbrella")];
        assert_eq!(
            match_description("", &candidates).unwrap_err(),
            MatchError::EmptyQuery
        );
    }

    #[test]
    fn test_empty_sample_is_rejected() {
        assert_eq!(match_speaker("", &[]).unwrap_err(), MatchError::EmptySample);
    }

    #[test]
    fn test_no_candidates_not_found() {
        let result = match_description("red umbrella outside", &[]).unwrap();
        assert!(!result.found());
        assert!(result.best().is_none());
        assert_eq!(result.total_matches, 0);
    }

    #[test]
    fn test_umbrella_scenario() {
        let candidates = vec![described(1, "Gate", "saw a red umbrella near the gate")];
        let result = match_description("red umbrella outside", &candidates).unwrap();
        assert!(result.found());
        let best = result.best().unwrap();
        assert_eq!(best.id, 1);
        assert_eq!(best.name, "Gate");
        assert!((best.similarity - 2.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_overlap_not_found() {
        let candidates = vec![described(1, "x", "hi friend")];
        let result = match_description("hello there", &candidates).unwrap();
        assert!(!result.found());
    }

    #[test]
    fn test_single_common_word_is_excluded() {
        let candidates = vec![described(1, "x", "xylophone in the attic")];
        let result = match_description("xylophone collection", &candidates).unwrap();
        assert!(!result.found());
    }

    #[test]
    fn test_identical_sets_score_one() {
        let candidates = vec![described(1, "x", "Blue Car Parked")];
        let result = match_description("parked blue car car", &candidates).unwrap();
        assert_eq!(result.best().unwrap().similarity, 1.0);
    }

    #[test]
    fn test_subset_does_not_score_one() {
        // Query is a strict subset; the larger set sets the denominator
        let candidates = vec![described(1, "x", "blue car parked outside")];
        let result = match_description("blue car", &candidates).unwrap();
        assert_eq!(result.best().unwrap().similarity, 0.5);
    }

    #[test]
    fn test_punctuation_is_part_of_token() {
        let candidates = vec![described(1, "x", "dr. sharma clinic")];
        let result = match_description("dr sharma", &candidates).unwrap();
        assert!(!result.found());
    }

    #[test]
    fn test_missing_description_is_empty() {
        let mut record = described(1, "x", "");
        record.recognition_data = Some(RecognitionData::default());
        let no_payload = MemoryRecord {
            recognition_data: None,
            ..described(2, "y", "")
        };
        let result = match_description("anything at all", &[record, no_payload]).unwrap();
        assert!(!result.found());
    }

    #[test]
    fn test_ranking_top_three_and_order() {
        let candidates = vec![
            described(1, "weak", "old brown dog sleeping on a porch in the sun"),
            described(2, "strong", "old brown dog"),
            described(3, "middle", "old brown dog barking"),
            described(4, "none", "cat"),
            described(5, "weakest", "brown dog with many other unrelated words here today"),
        ];
        let result = match_description("old brown dog", &candidates).unwrap();
        assert_eq!(result.total_matches, 4);
        assert_eq!(result.top.len(), TOP_MATCHES);
        let ids: Vec<i64> = result.top.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        for pair in result.top.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        for m in &result.top {
            assert!(m.similarity > 0.0 && m.similarity <= 1.0);
        }
    }

    #[test]
    fn test_top_list_shorter_than_three() {
        let candidates = vec![described(1, "a", "green door"), described(2, "b", "blue door")];
        let result = match_description("green door", &candidates).unwrap();
        assert_eq!(result.total_matches, 1);
        assert_eq!(result.top.len(), 1);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let candidates = vec![
            described(7, "first", "green door open"),
            described(3, "second", "green door shut"),
        ];
        let result = match_description("green door", &candidates).unwrap();
        let ids: Vec<i64> = result.top.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![7, 3]);
    }

    #[test]
    fn test_match_carries_payload() {
        let candidates = vec![described(9, "Gate", "red umbrella")];
        let result = match_description("red umbrella", &candidates).unwrap();
        let best = result.best().unwrap();
        assert_eq!(best.image_path.as_deref(), Some("memory_9.jpg"));
        assert_eq!(
            best.recognition_data.as_ref().map(|r| r.description()),
            Some("red umbrella")
        );
    }

    #[test]
    fn test_speaker_scenario_high_confidence() {
        let profiles = vec![voiced(4, "Ravi", "haan yaar kya scene hai")];
        let result = match_speaker("haan bhai kya haal hai", &profiles).unwrap();
        match result {
            SpeakerRecognition::Recognized(m) => {
                assert_eq!(m.id, 4);
                assert_eq!(m.name, "Ravi");
                assert!((m.similarity - 0.6).abs() < 1e-9);
                assert_eq!(m.confidence, Confidence::High);
            }
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[test]
    fn test_speaker_low_confidence_at_half() {
        let profiles = vec![voiced(1, "Asha", "good morning to everyone")];
        let result = match_speaker("good morning", &profiles).unwrap();
        match result {
            SpeakerRecognition::Recognized(m) => {
                assert_eq!(m.similarity, 0.5);
                assert_eq!(m.confidence, Confidence::Low);
            }
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[test]
    fn test_speaker_no_profiles_vs_not_recognized() {
        assert_eq!(
            match_speaker("hello there", &[]).unwrap(),
            SpeakerRecognition::NoProfiles
        );
        let profiles = vec![voiced(1, "Asha", "completely different words")];
        assert_eq!(
            match_speaker("hello there", &profiles).unwrap(),
            SpeakerRecognition::NotRecognized
        );
    }

    #[test]
    fn test_speaker_picks_best() {
        let profiles = vec![
            voiced(1, "Asha", "kya haal hai sab theek"),
            voiced(2, "Ravi", "kya haal hai"),
        ];
        match match_speaker("kya haal hai", &profiles).unwrap() {
            SpeakerRecognition::Recognized(m) => assert_eq!(m.name, "Ravi"),
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[test]
    fn test_word_set_collapses_duplicates_and_case() {
        let words = word_set("The the THE  cat\tsat\n");
        assert_eq!(words.len(), 3);
        assert!(words.contains("the"));
        assert!(words.contains("cat"));
        assert!(word_set("   ").is_empty());
    }
}
