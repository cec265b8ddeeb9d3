//! SQLite-backed high-score table.
//!
//! `ScoreStore` is created closed, opened once, and closed once. The
//! connection sits behind a mutex so every operation has it to itself. Ranked
//! reads degrade to empty results on failure; writes report a [`StoreError`].

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::model::{NewScore, ScoreRecord};

/// Limit used by callers that don't ask for a specific leaderboard size.
pub const DEFAULT_LIMIT: usize = 10;

const SELECT_COLUMNS: &str =
    "SELECT id, player_name, score, level_name, achieved_at, completion_time FROM high_scores";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Owner of the `high_scores` table.
pub struct ScoreStore {
    location: Location,
    conn: Mutex<Option<Connection>>,
}

impl ScoreStore {
    /// A closed store for the database file at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            location: Location::File(path.as_ref().to_path_buf()),
            conn: Mutex::new(None),
        }
    }

    /// A closed store that will live in memory once opened (for tests and throwaway runs).
    pub fn in_memory() -> Self {
        Self { location: Location::Memory, conn: Mutex::new(None) }
    }

    /// Convenience for `new` followed by `open`.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let store = Self::new(path);
        store.open()?;
        Ok(store)
    }

    /// Open the connection and create the schema. Opening an open store does nothing.
    pub fn open(&self) -> Result<(), StoreError> {
        let mut guard = self.conn.lock();
        if guard.is_some() {
            tracing::debug!("Score store already open");
            return Ok(());
        }

        let conn = match &self.location {
            Location::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        tracing::error!(path = %parent.display(), error = %e, "Failed to create score database directory");
                        StoreError::Persist(rusqlite::Error::InvalidPath(parent.to_path_buf()))
                    })?;
                }
                Connection::open(path)
            }
            Location::Memory => Connection::open_in_memory(),
        }
        .inspect_err(|e| tracing::error!(error = %e, "Failed to open score database"))?;

        init_schema(&conn).inspect_err(|e| {
            tracing::error!(error = %e, "Failed to initialize score schema");
        })?;

        match &self.location {
            Location::File(path) => tracing::info!(path = %path.display(), "Score database opened"),
            Location::Memory => tracing::debug!("In-memory score database opened"),
        }

        *guard = Some(conn);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.conn.lock().is_some()
    }

    /// Close the connection. Dropping the store closes it as well.
    pub fn close(&self) -> Result<(), StoreError> {
        let Some(conn) = self.conn.lock().take() else {
            return Ok(());
        };

        conn.close().map_err(|(_, e)| {
            tracing::error!(error = %e, "Failed to close score database");
            StoreError::Persist(e)
        })?;

        tracing::debug!("Score database closed");
        Ok(())
    }

    /// Append a score. The id and, unless supplied, the timestamp are assigned here.
    pub fn add(&self, entry: NewScore) -> Result<ScoreRecord, StoreError> {
        let achieved_at = entry.achieved_at.unwrap_or_else(Utc::now);

        let id = self
            .with_conn("add", |conn| {
                conn.execute(
                    "INSERT INTO high_scores (player_name, score, level_name, achieved_at, completion_time)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        entry.player_name,
                        entry.score,
                        entry.level_name,
                        achieved_at,
                        entry.completion_time_secs,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .inspect_err(|e| tracing::error!(error = %e, "Failed to add high score"))?;

        tracing::info!(
            id,
            player = %entry.player_name,
            score = entry.score,
            level_name = %entry.level_name,
            "High score added"
        );

        Ok(ScoreRecord {
            id,
            player_name: entry.player_name,
            score: entry.score,
            level_name: entry.level_name,
            achieved_at,
            completion_time_secs: entry.completion_time_secs,
        })
    }

    /// Best scores across all levels: score descending, earlier entries first on ties.
    pub fn top(&self, limit: usize) -> Vec<ScoreRecord> {
        if limit == 0 {
            return Vec::new();
        }

        self.with_conn("top", |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} ORDER BY score DESC, id ASC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![sql_limit(limit)], row_to_score)?;
            rows.collect()
        })
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to get high scores");
            Vec::new()
        })
    }

    /// Like [`ScoreStore::top`], restricted to one level (exact, case-sensitive match).
    pub fn top_for_level(&self, level_name: &str, limit: usize) -> Vec<ScoreRecord> {
        if limit == 0 {
            return Vec::new();
        }

        self.with_conn("top_for_level", |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE level_name = ?1 ORDER BY score DESC, id ASC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![level_name, sql_limit(limit)], row_to_score)?;
            rows.collect()
        })
        .unwrap_or_else(|e| {
            tracing::error!(level_name, error = %e, "Failed to get level high scores");
            Vec::new()
        })
    }

    /// Number of stored scores; 0 if the table can't be read.
    pub fn count(&self) -> usize {
        self.with_conn("count", |conn| {
            conn.query_row("SELECT COUNT(*) FROM high_scores", [], |row| row.get::<_, i64>(0))
        })
        .map(|n| usize::try_from(n).unwrap_or(0))
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to count high scores");
            0
        })
    }

    /// Delete every score. The AUTOINCREMENT sequence is kept, so ids are never reused.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        let removed = self
            .with_conn("clear_all", |conn| conn.execute("DELETE FROM high_scores", []))
            .inspect_err(|e| tracing::error!(error = %e, "Failed to clear high scores"))?;

        tracing::info!(removed, "All high scores cleared");
        Ok(())
    }

    fn with_conn<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let guard = self.conn.lock();
        let Some(conn) = guard.as_ref() else {
            if cfg!(debug_assertions) {
                panic!("score store is not open (called `{op}`)");
            }
            tracing::error!(operation = op, "Score store used while closed");
            return Err(StoreError::NotOpen);
        };

        f(conn).map_err(StoreError::from)
    }
}

impl Drop for ScoreStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "Score database did not close cleanly");
        }
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS high_scores (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_name TEXT NOT NULL,
            score INTEGER NOT NULL,
            level_name TEXT NOT NULL DEFAULT 'Default',
            achieved_at TEXT NOT NULL,
            completion_time REAL NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_high_scores_player ON high_scores(player_name);
        CREATE INDEX IF NOT EXISTS idx_high_scores_level ON high_scores(level_name);
        CREATE INDEX IF NOT EXISTS idx_high_scores_rank ON high_scores(score DESC, id ASC);
        "#,
    )
}

fn row_to_score(row: &rusqlite::Row) -> rusqlite::Result<ScoreRecord> {
    Ok(ScoreRecord {
        id: row.get(0)?,
        player_name: row.get(1)?,
        score: row.get(2)?,
        level_name: row.get(3)?,
        achieved_at: row.get(4)?,
        completion_time_secs: row.get(5)?,
    })
}

// SQLite takes a signed limit; anything past i64::MAX is "everything" anyway.
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
