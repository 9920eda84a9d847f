//! SQLite-backed [`ShareStore`].
//!
//! One `shared_tweets` table. List-valued columns hold JSON text; images are
//! a JSON array of base64 strings. `created_at` is RFC 3339.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use super::store::{ShareStore, StoreError};
use crate::types::{ImageData, Satisfaction, SharedTweetRecord, TweetVariation};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS shared_tweets (
    id              TEXT PRIMARY KEY,
    images          TEXT NOT NULL,
    restaurant_name TEXT,
    menus           TEXT NOT NULL,
    satisfaction    TEXT NOT NULL,
    variations      TEXT NOT NULL,
    created_at      TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

pub struct SqliteShareStore {
    conn: Mutex<Connection>,
}

impl SqliteShareStore {
    /// Open from a `database_url`: a file path, `sqlite://path`, or `:memory:`.
    pub fn open(database_url: &str) -> Result<Self, StoreError> {
        let path = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url);
        if path == ":memory:" {
            return Self::open_in_memory();
        }
        Self::open_path(Path::new(path))
    }

    /// Open or create a database file at `path`.
    pub fn open_path(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Connection(e.to_string()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        info!(path = %path.display(), "opened share database");
        Self::with_schema(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Connection(e.to_string()))?;
        Self::with_schema(conn)
    }

    fn with_schema(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Raw column values of one `shared_tweets` row.
struct Row {
    id: String,
    images: String,
    restaurant_name: Option<String>,
    menus: String,
    satisfaction: String,
    variations: String,
    created_at: String,
}

impl Row {
    fn into_record(self) -> Result<SharedTweetRecord, StoreError> {
        let id = self.id;
        let corrupt = |reason: String| StoreError::Corrupt {
            id: id.clone(),
            reason,
        };

        let images: Vec<ImageData> =
            serde_json::from_str(&self.images).map_err(|e| corrupt(format!("images: {e}")))?;
        let menus: Vec<String> =
            serde_json::from_str(&self.menus).map_err(|e| corrupt(format!("menus: {e}")))?;
        let variations: Vec<TweetVariation> = serde_json::from_str(&self.variations)
            .map_err(|e| corrupt(format!("variations: {e}")))?;
        let satisfaction: Satisfaction = self
            .satisfaction
            .parse()
            .map_err(|s| corrupt(format!("satisfaction: {s}")))?;
        let created_at =
            parse_timestamp(&self.created_at).ok_or_else(|| corrupt("created_at".into()))?;

        Ok(SharedTweetRecord {
            id,
            images,
            restaurant_name: self.restaurant_name,
            menus,
            satisfaction,
            variations,
            created_at,
        })
    }
}

/// RFC 3339, or SQLite's `CURRENT_TIMESTAMP` form for rows written by hand.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Query(e.to_string()))
}

impl ShareStore for SqliteShareStore {
    fn insert(&self, record: &SharedTweetRecord) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Query(e.to_string()))?;

        conn.execute(
            "INSERT INTO shared_tweets \
             (id, images, restaurant_name, menus, satisfaction, variations, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                to_json(&record.images)?,
                record.restaurant_name,
                to_json(&record.menus)?,
                record.satisfaction.as_str(),
                to_json(&record.variations)?,
                record.created_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Duplicate(record.id.clone())
            }
            other => StoreError::Query(other.to_string()),
        })?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<SharedTweetRecord>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let row = conn
            .query_row(
                "SELECT id, images, restaurant_name, menus, satisfaction, variations, created_at \
                 FROM shared_tweets WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Row {
                        id: row.get(0)?,
                        images: row.get(1)?,
                        restaurant_name: row.get(2)?,
                        menus: row.get(3)?,
                        satisfaction: row.get(4)?,
                        variations: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(|e| StoreError::Query(e.to_string()))?;

        row.map(Row::into_record).transpose()
    }
}
