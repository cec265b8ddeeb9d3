//! Async handle over a shared [`ScoreStore`].
//!
//! Each call runs the SQLite work on tokio's blocking pool and awaits it, so
//! the caller's runtime thread is never held up by disk I/O. Clones share the
//! same store; the store's mutex serializes them.

use std::sync::Arc;

use tokio::task::JoinError;

use crate::error::StoreError;
use crate::model::{NewScore, ScoreRecord};
use crate::store::ScoreStore;

#[derive(Clone)]
pub struct Leaderboard {
    store: Arc<ScoreStore>,
}

impl Leaderboard {
    pub fn new(store: Arc<ScoreStore>) -> Self {
        Self { store }
    }

    /// The underlying store, e.g. to close it at shutdown.
    pub fn store(&self) -> &Arc<ScoreStore> {
        &self.store
    }

    pub async fn add(&self, entry: NewScore) -> Result<ScoreRecord, StoreError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.add(entry))
            .await
            .map_err(join_failure)?
    }

    pub async fn top(&self, limit: usize) -> Vec<ScoreRecord> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.top(limit))
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %join_failure(e), "Leaderboard query did not complete");
                Vec::new()
            })
    }

    pub async fn top_for_level(&self, level_name: &str, limit: usize) -> Vec<ScoreRecord> {
        let store = self.store.clone();
        let level_name = level_name.to_string();
        tokio::task::spawn_blocking(move || store.top_for_level(&level_name, limit))
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %join_failure(e), "Level leaderboard query did not complete");
                Vec::new()
            })
    }

    pub async fn count(&self) -> usize {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.count())
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %join_failure(e), "Score count did not complete");
                0
            })
    }

    pub async fn clear_all(&self) -> Result<(), StoreError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.clear_all())
            .await
            .map_err(join_failure)?
    }
}

// A panic on the blocking pool (a closed store in debug builds) is re-raised
// on the caller rather than turned into a quiet error.
fn join_failure(err: JoinError) -> StoreError {
    match err.try_into_panic() {
        Ok(payload) => std::panic::resume_unwind(payload),
        Err(err) => StoreError::Interrupted(err.to_string()),
    }
}
