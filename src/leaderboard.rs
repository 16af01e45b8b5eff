use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use crate::app_dirs::AppDirs;

pub const MAX_PLAYER_NAME_LEN: usize = 50;
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

#[derive(Debug)]
pub enum LeaderboardError {
    EmptyPlayerName,
    PlayerNameTooLong { len: usize, max: usize },
    AccuracyOutOfRange { accuracy: f64 },
    NegativeDuration { secs: f64 },
    Storage(rusqlite::Error),
    Io(std::io::Error),
}

impl fmt::Display for LeaderboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPlayerName => write!(f, "player name must not be empty"),
            Self::PlayerNameTooLong { len, max } => {
                write!(f, "player name is {len} characters, max is {max}")
            }
            Self::AccuracyOutOfRange { accuracy } => {
                write!(f, "accuracy {accuracy} is outside 0-100")
            }
            Self::NegativeDuration { secs } => write!(f, "game duration {secs}s is negative"),
            Self::Storage(e) => write!(f, "leaderboard storage error: {e}"),
            Self::Io(e) => write!(f, "leaderboard io error: {e}"),
        }
    }
}

impl std::error::Error for LeaderboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for LeaderboardError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e)
    }
}

impl From<std::io::Error> for LeaderboardError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// End-of-session result handed to a score submitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub player_name: String,
    pub score: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words_typed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

impl ScoreRecord {
    /// Check the record and return it with a trimmed player name
    pub fn validate(mut self) -> Result<Self, LeaderboardError> {
        self.player_name = self.player_name.trim().to_string();
        let len = self.player_name.chars().count();
        if len == 0 {
            return Err(LeaderboardError::EmptyPlayerName);
        }
        if len > MAX_PLAYER_NAME_LEN {
            return Err(LeaderboardError::PlayerNameTooLong {
                len,
                max: MAX_PLAYER_NAME_LEN,
            });
        }
        if let Some(accuracy) = self.accuracy {
            if !(0.0..=100.0).contains(&accuracy) {
                return Err(LeaderboardError::AccuracyOutOfRange { accuracy });
            }
        }
        if let Some(secs) = self.game_duration {
            if secs < 0.0 || secs.is_nan() {
                return Err(LeaderboardError::NegativeDuration { secs });
            }
        }
        Ok(self)
    }
}

/// A stored leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub record: ScoreRecord,
    pub created_at: DateTime<Local>,
}

/// Where finished sessions are sent
pub trait ScoreSubmitter {
    fn submit(&self, record: &ScoreRecord) -> Result<(), LeaderboardError>;
    fn fetch_leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;
}

impl<T: ScoreSubmitter + ?Sized> ScoreSubmitter for Rc<T> {
    fn submit(&self, record: &ScoreRecord) -> Result<(), LeaderboardError> {
        (**self).submit(record)
    }

    fn fetch_leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        (**self).fetch_leaderboard(limit)
    }
}

pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_LEADERBOARD_LIMIT)
}

/// SQLite-backed local leaderboard
#[derive(Debug)]
pub struct LeaderboardDb {
    conn: Connection,
}

impl LeaderboardDb {
    /// Open the leaderboard in the default state directory
    pub fn new() -> Result<Self, LeaderboardError> {
        let path = AppDirs::leaderboard_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LeaderboardError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, LeaderboardError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, LeaderboardError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player_name TEXT NOT NULL,
                score INTEGER NOT NULL CHECK (score >= 0),
                words_typed INTEGER,
                accuracy REAL CHECK (accuracy IS NULL OR (accuracy >= 0 AND accuracy <= 100)),
                game_duration REAL,
                difficulty TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scores_score ON scores(score DESC)",
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn insert(&self, record: &ScoreRecord) -> Result<(), LeaderboardError> {
        let record = record.clone().validate()?;
        self.conn.execute(
            r#"
            INSERT INTO scores
            (player_name, score, words_typed, accuracy, game_duration, difficulty, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.player_name,
                record.score as i64,
                record.words_typed,
                record.accuracy,
                record.game_duration,
                record.difficulty,
                Local::now().to_rfc3339(),
            ],
        )?;
        log::info!("saved score {} for {}", record.score, record.player_name);
        Ok(())
    }

    /// Top scores, highest first; equal scores keep submission order
    pub fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT player_name, score, words_typed, accuracy, game_duration, difficulty, created_at
            FROM scores
            ORDER BY score DESC, id ASC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([clamp_limit(limit) as i64], |row| {
            let created_at: String = row.get(6)?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        6,
                        "created_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);
            let score: i64 = row.get(1)?;

            Ok((
                ScoreRecord {
                    player_name: row.get(0)?,
                    score: score.max(0) as u64,
                    words_typed: row.get(2)?,
                    accuracy: row.get(3)?,
                    game_duration: row.get(4)?,
                    difficulty: row.get(5)?,
                },
                created_at,
            ))
        })?;

        let mut entries = Vec::new();
        for (idx, row) in rows.enumerate() {
            let (record, created_at) = row?;
            entries.push(LeaderboardEntry {
                rank: idx + 1,
                record,
                created_at,
            });
        }
        Ok(entries)
    }

    pub fn count(&self) -> Result<usize, LeaderboardError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM scores", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    /// Remove every stored score
    pub fn clear(&self) -> Result<(), LeaderboardError> {
        self.conn.execute("DELETE FROM scores", [])?;
        Ok(())
    }
}

impl ScoreSubmitter for LeaderboardDb {
    fn submit(&self, record: &ScoreRecord) -> Result<(), LeaderboardError> {
        self.insert(record)
    }

    fn fetch_leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        self.top(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn record(name: &str, score: u64) -> ScoreRecord {
        ScoreRecord {
            player_name: name.to_string(),
            score,
            words_typed: Some(12),
            accuracy: Some(97.5),
            game_duration: Some(61.2),
            difficulty: Some("moderate".to_string()),
        }
    }

    #[test]
    fn test_validate_trims_name() {
        let ok = record("  ace  ", 10).validate().unwrap();
        assert_eq!(ok.player_name, "ace");
    }

    #[test]
    fn test_validate_rejects_bad_records() {
        assert_matches!(
            record("   ", 10).validate(),
            Err(LeaderboardError::EmptyPlayerName)
        );
        assert_matches!(
            record(&"x".repeat(51), 10).validate(),
            Err(LeaderboardError::PlayerNameTooLong { len: 51, max: 50 })
        );
        assert!(record(&"x".repeat(50), 10).validate().is_ok());

        let mut bad_accuracy = record("ace", 10);
        bad_accuracy.accuracy = Some(100.5);
        assert_matches!(
            bad_accuracy.validate(),
            Err(LeaderboardError::AccuracyOutOfRange { .. })
        );

        let mut bad_duration = record("ace", 10);
        bad_duration.game_duration = Some(-1.0);
        assert_matches!(
            bad_duration.validate(),
            Err(LeaderboardError::NegativeDuration { .. })
        );
    }

    #[test]
    fn test_optional_fields_are_omitted_from_json() {
        let minimal = ScoreRecord {
            player_name: "ace".to_string(),
            score: 5,
            words_typed: None,
            accuracy: None,
            game_duration: None,
            difficulty: None,
        };
        let json = serde_json::to_string(&minimal).unwrap();
        assert_eq!(json, r#"{"player_name":"ace","score":5}"#);

        let parsed: ScoreRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, minimal);
    }

    #[test]
    fn test_submit_and_fetch_sorted() {
        let db = LeaderboardDb::open_in_memory().unwrap();
        db.submit(&record("low", 50)).unwrap();
        db.submit(&record("high", 500)).unwrap();
        db.submit(&record("mid", 200)).unwrap();
        db.submit(&record("mid-late", 200)).unwrap();

        let top = db.fetch_leaderboard(10).unwrap();
        let names: Vec<&str> = top.iter().map(|e| e.record.player_name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "mid-late", "low"]);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[3].rank, 4);
        assert_eq!(top[0].record.accuracy, Some(97.5));
    }

    #[test]
    fn test_fetch_respects_limit() {
        let db = LeaderboardDb::open_in_memory().unwrap();
        for score in 0..15 {
            db.submit(&record("p", score)).unwrap();
        }
        assert_eq!(db.top(3).unwrap().len(), 3);
        assert_eq!(db.top(0).unwrap().len(), 1);
        assert_eq!(db.top(1000).unwrap().len(), 15);
        assert_eq!(db.top(3).unwrap()[0].record.score, 14);
    }

    #[test]
    fn test_invalid_record_is_not_stored() {
        let db = LeaderboardDb::open_in_memory().unwrap();
        assert!(db.submit(&record("", 50)).is_err());
        assert_eq!(db.count().unwrap(), 0);
    }

    #[test]
    fn test_clear() {
        let db = LeaderboardDb::open_in_memory().unwrap();
        db.submit(&record("p", 1)).unwrap();
        db.clear().unwrap();
        assert_eq!(db.count().unwrap(), 0);
    }

    #[test]
    fn test_file_backed_db_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.db");
        {
            let db = LeaderboardDb::open(&path).unwrap();
            db.submit(&record("saved", 42)).unwrap();
        }
        let db = LeaderboardDb::open(&path).unwrap();
        assert_eq!(db.top(5).unwrap()[0].record.player_name, "saved");
    }

    #[test]
    fn test_shared_db_submits_through_rc() {
        let db = Rc::new(LeaderboardDb::open_in_memory().unwrap());
        let submitter: Box<dyn ScoreSubmitter> = Box::new(Rc::clone(&db));
        submitter.submit(&record("shared", 7)).unwrap();
        assert_eq!(db.count().unwrap(), 1);
        assert_eq!(submitter.fetch_leaderboard(1).unwrap()[0].record.score, 7);
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(10), 10);
        assert_eq!(clamp_limit(101), MAX_LEADERBOARD_LIMIT);
    }
}
