//! SQLite-backed show catalog implementation.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use super::{title_key, CatalogError, CatalogSession, CatalogShow, CatalogStore, CommitSummary};

const SHOW_COLUMNS: &str = "id, title, description, start_date, status, network, image_url, \
                            rating, genres, content_type, created_at, updated_at";

/// SQLite-backed show catalog.
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    /// Create a new SQLite catalog, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory SQLite catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS shows (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                title_key TEXT NOT NULL,
                description TEXT NOT NULL,
                start_date TEXT NOT NULL,
                status TEXT NOT NULL,
                network TEXT NOT NULL,
                image_url TEXT NOT NULL,
                rating REAL NOT NULL DEFAULT 0,
                genres TEXT NOT NULL,
                content_type TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Not unique: two shows may legitimately share a title.
            CREATE INDEX IF NOT EXISTS idx_shows_title_key ON shows(title_key);
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    /// Get a show by local ID.
    pub fn get(&self, id: &str) -> Result<CatalogShow, CatalogError> {
        let conn = lock(&self.conn)?;
        conn.query_row(
            &format!("SELECT {} FROM shows WHERE id = ?", SHOW_COLUMNS),
            params![id],
            row_to_show,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => CatalogError::NotFound(id.to_string()),
            _ => CatalogError::Database(e.to_string()),
        })
    }

    /// Number of committed shows.
    pub fn count(&self) -> Result<u64, CatalogError> {
        let conn = lock(&self.conn)?;
        conn.query_row("SELECT COUNT(*) FROM shows", [], |row| row.get(0))
            .map_err(|e| CatalogError::Database(e.to_string()))
    }

    /// All committed shows, oldest first.
    pub fn list(&self) -> Result<Vec<CatalogShow>, CatalogError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM shows ORDER BY created_at ASC, rowid ASC",
                SHOW_COLUMNS
            ))
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], row_to_show)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut shows = Vec::new();
        for row in rows {
            shows.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }
        Ok(shows)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn begin(&self) -> Result<Box<dyn CatalogSession>, CatalogError> {
        // Fail fast if the connection is unusable rather than at commit time.
        drop(lock(&self.conn)?);

        Ok(Box::new(SqliteSession {
            conn: Arc::clone(&self.conn),
            inserts: Vec::new(),
            updates: Vec::new(),
        }))
    }
}

/// Session staging changes in memory until commit.
struct SqliteSession {
    conn: Arc<Mutex<Connection>>,
    inserts: Vec<CatalogShow>,
    updates: Vec<CatalogShow>,
}

impl SqliteSession {
    fn staged_update(&self, id: &str) -> Option<&CatalogShow> {
        self.updates.iter().find(|s| s.id == id)
    }
}

impl CatalogSession for SqliteSession {
    fn find_by_title(&mut self, title: &str) -> Result<Option<CatalogShow>, CatalogError> {
        let key = title_key(title);

        let committed = {
            let conn = lock(&self.conn)?;
            conn.query_row(
                &format!(
                    "SELECT {} FROM shows WHERE title_key = ? \
                     ORDER BY created_at ASC, rowid ASC LIMIT 1",
                    SHOW_COLUMNS
                ),
                params![&key],
                row_to_show,
            )
            .optional()
            .map_err(|e| CatalogError::Database(e.to_string()))?
        };

        if let Some(show) = committed {
            return Ok(Some(self.staged_update(&show.id).cloned().unwrap_or(show)));
        }

        Ok(self.inserts.iter().find(|s| s.title_key() == key).cloned())
    }

    fn insert(&mut self, show: CatalogShow) -> Result<(), CatalogError> {
        if self.inserts.iter().any(|s| s.id == show.id) {
            return Err(CatalogError::Database(format!(
                "show {} is already staged for insert",
                show.id
            )));
        }
        self.inserts.push(show);
        Ok(())
    }

    fn update(&mut self, show: CatalogShow) -> Result<(), CatalogError> {
        if let Some(staged) = self.inserts.iter_mut().find(|s| s.id == show.id) {
            *staged = show;
        } else if let Some(staged) = self.updates.iter_mut().find(|s| s.id == show.id) {
            *staged = show;
        } else {
            self.updates.push(show);
        }
        Ok(())
    }

    fn pending(&self) -> usize {
        self.inserts.len() + self.updates.len()
    }

    fn commit(self: Box<Self>) -> Result<CommitSummary, CatalogError> {
        let mut conn = lock(&self.conn)?;
        let tx = conn
            .transaction()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        for show in &self.inserts {
            let genres = encode_genres(&show.genres)?;
            tx.execute(
                "INSERT INTO shows (id, title, title_key, description, start_date, status, network,
                                    image_url, rating, genres, content_type, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    &show.id,
                    &show.title,
                    show.title_key(),
                    &show.description,
                    encode_time(&show.start_date),
                    &show.status,
                    &show.network,
                    &show.image_url,
                    show.rating,
                    genres,
                    &show.content_type,
                    encode_time(&show.created_at),
                    encode_time(&show.updated_at),
                ],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        }

        for show in &self.updates {
            let genres = encode_genres(&show.genres)?;
            let rows_affected = tx
                .execute(
                    "UPDATE shows SET title = ?, title_key = ?, description = ?, start_date = ?,
                                      status = ?, network = ?, image_url = ?, rating = ?,
                                      genres = ?, content_type = ?, updated_at = ?
                     WHERE id = ?",
                    params![
                        &show.title,
                        show.title_key(),
                        &show.description,
                        encode_time(&show.start_date),
                        &show.status,
                        &show.network,
                        &show.image_url,
                        show.rating,
                        genres,
                        &show.content_type,
                        encode_time(&show.updated_at),
                        &show.id,
                    ],
                )
                .map_err(|e| CatalogError::Database(e.to_string()))?;

            if rows_affected == 0 {
                // Dropping the transaction rolls back everything staged so far.
                return Err(CatalogError::NotFound(show.id.clone()));
            }
        }

        tx.commit()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(CommitSummary {
            inserted: self.inserts.len(),
            updated: self.updates.len(),
        })
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, CatalogError> {
    conn.lock()
        .map_err(|_| CatalogError::Database("catalog connection lock poisoned".to_string()))
}

fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn encode_genres(genres: &[String]) -> Result<String, CatalogError> {
    serde_json::to_string(genres).map_err(|e| CatalogError::Serialization(e.to_string()))
}

fn decode_time(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_show(row: &rusqlite::Row) -> rusqlite::Result<CatalogShow> {
    let genres_raw: String = row.get(8)?;
    let genres: Vec<String> = serde_json::from_str(&genres_raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(CatalogShow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        start_date: decode_time(row, 3)?,
        status: row.get(4)?,
        network: row.get(5)?,
        image_url: row.get(6)?,
        rating: row.get(7)?,
        genres,
        content_type: row.get(9)?,
        created_at: decode_time(row, 10)?,
        updated_at: decode_time(row, 11)?,
    })
}
