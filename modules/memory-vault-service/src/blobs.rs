//! On-disk storage for image and audio payloads attached to memories.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    Image,
    Audio,
}

impl BlobKind {
    fn prefix(&self) -> &'static str {
        match self {
            BlobKind::Image => "memory",
            BlobKind::Audio => "audio",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            BlobKind::Image => "jpg",
            BlobKind::Audio => "webm",
        }
    }
}

pub struct BlobStore {
    image_dir: PathBuf,
    audio_dir: PathBuf,
}

impl BlobStore {
    /// Open the store, creating both directories if needed.
    pub fn open(image_dir: impl Into<PathBuf>, audio_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let store = Self {
            image_dir: image_dir.into(),
            audio_dir: audio_dir.into(),
        };
        std::fs::create_dir_all(&store.image_dir)?;
        std::fs::create_dir_all(&store.audio_dir)?;
        Ok(store)
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    fn dir(&self, kind: BlobKind) -> &Path {
        match kind {
            BlobKind::Image => &self.image_dir,
            BlobKind::Audio => &self.audio_dir,
        }
    }

    /// Decode a base64 image and write it, returning the stored file name.
    pub fn store_image(&self, payload: &str, record_id: i64) -> Result<String, BlobError> {
        self.store(BlobKind::Image, payload, record_id)
    }

    /// Decode a base64 audio clip and write it, returning the stored file name.
    pub fn store_audio(&self, payload: &str, record_id: i64) -> Result<String, BlobError> {
        self.store(BlobKind::Audio, payload, record_id)
    }

    fn store(&self, kind: BlobKind, payload: &str, record_id: i64) -> Result<String, BlobError> {
        let bytes = decode_payload(payload)?;
        let file_name = blob_file_name(kind, record_id);
        std::fs::write(self.dir(kind).join(&file_name), bytes)?;
        log::info!("Stored {:?} blob {}", kind, file_name);
        Ok(file_name)
    }

    /// Best-effort removal. Failures are logged and swallowed.
    pub fn remove(&self, kind: BlobKind, file_name: &str) {
        let Some(name) = Path::new(file_name).file_name() else {
            log::warn!("Refusing to remove blob with no file name: {}", file_name);
            return;
        };
        let path = self.dir(kind).join(name);
        if let Err(e) = std::fs::remove_file(&path) {
            log::warn!("Failed to remove blob {}: {}", path.display(), e);
        }
    }
}

/// Strip an optional `data:<mime>;base64,` header and decode the rest.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let encoded = match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    };
    STANDARD.decode(encoded.trim())
}

/// `{prefix}_{record_id}_{YYYYmmdd_HHMMSS_mmm}.{ext}`
fn blob_file_name(kind: BlobKind, record_id: i64) -> String {
    format!(
        "{}_{}_{}.{}",
        kind.prefix(),
        record_id,
        Utc::now().format("%Y%m%d_%H%M%S_%3f"),
        kind.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, BlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::open(dir.path().join("images"), dir.path().join("audio")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_directories() {
        let (_dir, store) = store();
        assert!(store.image_dir().is_dir());
        assert!(store.audio_dir().is_dir());
    }

    #[test]
    fn test_decode_with_and_without_data_url() {
        let encoded = STANDARD.encode(b"hello");
        assert_eq!(decode_payload(&encoded).unwrap(), b"hello");
        let with_prefix = format!("data:image/png;base64,{}", encoded);
        assert_eq!(decode_payload(&with_prefix).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_payload("not base64 at all!!").is_err());
    }

    #[test]
    fn test_store_image_writes_file() {
        let (_dir, store) = store();
        let payload = format!("data:image/jpeg;base64,{}", STANDARD.encode([1u8, 2, 3]));
        let name = store.store_image(&payload, 42).unwrap();
        assert!(name.starts_with("memory_42_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(std::fs::read(store.image_dir().join(&name)).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_store_audio_writes_file() {
        let (_dir, store) = store();
        let name = store.store_audio(&STANDARD.encode(b"ogg"), 7).unwrap();
        assert!(name.starts_with("audio_7_"));
        assert!(name.ends_with(".webm"));
        assert!(store.audio_dir().join(&name).is_file());
    }

    #[test]
    fn test_malformed_payload_is_decode_error() {
        let (_dir, store) = store();
        let err = store.store_image("%%%", 1).unwrap_err();
        assert!(matches!(err, BlobError::Decode(_)));
        assert_eq!(std::fs::read_dir(store.image_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_remove_is_best_effort() {
        let (_dir, store) = store();
        let name = store.store_image(&STANDARD.encode(b"x"), 1).unwrap();
        store.remove(BlobKind::Image, &name);
        assert!(!store.image_dir().join(&name).exists());
        // Already gone: must not panic
        store.remove(BlobKind::Image, &name);
    }
}
