//! SQLite database operations for memories and the user profile.

use chrono::{SecondsFormat, Utc};
use memory_vault_types::*;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};
use serde_json::Value;

const MEMORY_COLUMNS: &str = "id, type, content, image_path, name, created_at, metadata,
                              recognition_data, voice_data, audio_path";

/// A memory about to be inserted. Blob paths are attached afterwards.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub kind: MemoryKind,
    pub content: Option<String>,
    pub name: String,
    pub metadata: Value,
    pub recognition_data: Option<RecognitionData>,
    pub voice_data: Option<VoiceData>,
}

/// Blob handles left behind by a deleted memory.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RemovedBlobs {
    pub image_path: Option<String>,
    pub audio_path: Option<String>,
}

pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    pub fn open(path: &str) -> SqliteResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.create_tables()?;
        Ok(db)
    }

    fn create_tables(&self) -> SqliteResult<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS memories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                content TEXT,
                image_path TEXT,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                recognition_data TEXT,
                voice_data TEXT,
                audio_path TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_memories_name ON memories(name)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_memories_created ON memories(created_at DESC)",
            [],
        )?;

        // Single row, pinned to id 1, so a replace is one upsert
        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                name TEXT,
                interests TEXT NOT NULL DEFAULT '[]',
                goals TEXT NOT NULL DEFAULT '[]',
                skill_level TEXT,
                business_type TEXT,
                preferred_language TEXT,
                personality_type TEXT,
                last_updated TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    // =====================================================
    // Memory Operations
    // =====================================================

    pub fn insert_memory(&self, memory: &NewMemory) -> SqliteResult<i64> {
        let conn = self.conn.lock();
        let now = timestamp();
        let metadata = to_json(&memory.metadata)?;
        let recognition = memory.recognition_data.as_ref().map(to_json).transpose()?;
        let voice = memory.voice_data.as_ref().map(to_json).transpose()?;

        conn.execute(
            "INSERT INTO memories (type, content, name, created_at, metadata, recognition_data, voice_data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                memory.kind.as_str(),
                memory.content,
                memory.name,
                now,
                metadata,
                recognition,
                voice
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn set_image_path(&self, id: i64, path: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE memories SET image_path = ?1 WHERE id = ?2",
            rusqlite::params![path, id],
        )?;
        Ok(rows > 0)
    }

    pub fn set_audio_path(&self, id: i64, path: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE memories SET audio_path = ?1 WHERE id = ?2",
            rusqlite::params![path, id],
        )?;
        Ok(rows > 0)
    }

    #[cfg(test)]
    pub fn get_memory(&self, id: i64) -> SqliteResult<Option<MemoryRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM memories WHERE id = ?1", MEMORY_COLUMNS),
            [id],
            row_to_memory,
        )
        .optional()
    }

    /// All memories, newest first.
    pub fn list_memories(&self) -> SqliteResult<Vec<MemoryRecord>> {
        self.select_memories("1=1", &[])
    }

    /// Case-insensitive substring search over name, content and the stored
    /// recognition payload.
    pub fn search_memories(&self, query: &str) -> SqliteResult<Vec<MemoryRecord>> {
        let pattern = format!("%{}%", escape_like(query));
        self.select_memories(
            "name LIKE ?1 ESCAPE '\\'
             OR content LIKE ?1 ESCAPE '\\'
             OR recognition_data LIKE ?1 ESCAPE '\\'",
            &[&pattern as &dyn rusqlite::ToSql],
        )
    }

    /// Memories that can take part in description matching.
    pub fn recognition_candidates(&self) -> SqliteResult<Vec<MemoryRecord>> {
        self.select_memories("recognition_data IS NOT NULL", &[])
    }

    /// Memories that can take part in speaker matching.
    pub fn voice_candidates(&self) -> SqliteResult<Vec<MemoryRecord>> {
        self.select_memories("voice_data IS NOT NULL", &[])
    }

    fn select_memories(
        &self,
        condition: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> SqliteResult<Vec<MemoryRecord>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM memories WHERE {} ORDER BY created_at DESC, id DESC",
            MEMORY_COLUMNS, condition
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params, row_to_memory)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }

    /// Delete a memory, returning its blob handles, or `None` if no such id.
    pub fn delete_memory(&self, id: i64) -> SqliteResult<Option<RemovedBlobs>> {
        let conn = self.conn.lock();
        let blobs = conn
            .query_row(
                "SELECT image_path, audio_path FROM memories WHERE id = ?1",
                [id],
                |row| {
                    Ok(RemovedBlobs {
                        image_path: row.get(0)?,
                        audio_path: row.get(1)?,
                    })
                },
            )
            .optional()?;
        if blobs.is_some() {
            conn.execute("DELETE FROM memories WHERE id = ?1", [id])?;
        }
        Ok(blobs)
    }

    // =====================================================
    // Profile Operations
    // =====================================================

    pub fn get_profile(&self) -> SqliteResult<Option<UserProfile>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT name, interests, goals, skill_level, business_type,
                    preferred_language, personality_type, last_updated
             FROM user_profile WHERE id = 1",
            [],
            |row| {
                let interests: String = row.get(1)?;
                let goals: String = row.get(2)?;
                Ok(UserProfile {
                    name: row.get(0)?,
                    interests: serde_json::from_str(&interests).unwrap_or_default(),
                    goals: serde_json::from_str(&goals).unwrap_or_default(),
                    skill_level: row.get(3)?,
                    business_type: row.get(4)?,
                    preferred_language: row.get(5)?,
                    personality_type: row.get(6)?,
                    last_updated: row.get(7)?,
                })
            },
        )
        .optional()
    }

    /// Replace the stored profile in a single statement. Every field is
    /// overwritten, including ones the new profile leaves empty.
    pub fn replace_profile(&self, profile: &UserProfile) -> SqliteResult<UserProfile> {
        let conn = self.conn.lock();
        let now = timestamp();
        let interests = to_json(&profile.interests)?;
        let goals = to_json(&profile.goals)?;

        conn.execute(
            "INSERT INTO user_profile (id, name, interests, goals, skill_level, business_type,
                                       preferred_language, personality_type, last_updated)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                interests = excluded.interests,
                goals = excluded.goals,
                skill_level = excluded.skill_level,
                business_type = excluded.business_type,
                preferred_language = excluded.preferred_language,
                personality_type = excluded.personality_type,
                last_updated = excluded.last_updated",
            rusqlite::params![
                profile.name,
                interests,
                goals,
                profile.skill_level,
                profile.business_type,
                profile.preferred_language,
                profile.personality_type,
                now
            ],
        )?;

        Ok(UserProfile {
            last_updated: Some(now),
            ..profile.clone()
        })
    }

    // =====================================================
    // Stats
    // =====================================================

    pub fn get_stats(&self) -> SqliteResult<StoreStats> {
        let conn = self.conn.lock();
        let count = |sql: &str| -> SqliteResult<i64> { conn.query_row(sql, [], |r| r.get(0)) };
        Ok(StoreStats {
            total_memories: count("SELECT COUNT(*) FROM memories")?,
            recognition_profiles: count(
                "SELECT COUNT(*) FROM memories WHERE recognition_data IS NOT NULL",
            )?,
            voice_profiles: count("SELECT COUNT(*) FROM memories WHERE voice_data IS NOT NULL")?,
            has_user_profile: count("SELECT COUNT(*) FROM user_profile")? > 0,
        })
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_json<T: serde::Serialize>(value: &T) -> SqliteResult<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Escape `LIKE` wildcards so the query matches literally.
fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn row_to_memory(row: &rusqlite::Row) -> rusqlite::Result<MemoryRecord> {
    let kind: String = row.get(1)?;
    let metadata: Option<String> = row.get(6)?;
    let recognition: Option<String> = row.get(7)?;
    let voice: Option<String> = row.get(8)?;

    Ok(MemoryRecord {
        id: row.get(0)?,
        kind: MemoryKind::parse(&kind).unwrap_or(MemoryKind::Text),
        content: row.get(2)?,
        image_path: row.get(3)?,
        name: row.get(4)?,
        created_at: row.get(5)?,
        metadata: metadata
            .and_then(|m| serde_json::from_str(&m).ok())
            .unwrap_or_else(|| Value::Object(Default::default())),
        recognition_data: recognition.and_then(|r| serde_json::from_str(&r).ok()),
        voice_data: voice.and_then(|v| serde_json::from_str(&v).ok()),
        audio_path: row.get(9)?,
    })
}
