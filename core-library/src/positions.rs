//! # Setlist Position Manager
//!
//! Inserts, removes and moves songs within a setlist while keeping positions
//! unique and dense (`1..=n`) under the `UNIQUE(setlist_id, position)`
//! constraint.
//!
//! SQLite checks uniqueness row by row during an `UPDATE`, so shifting a
//! block by ±1 in place can collide with a neighbour that has not moved yet.
//! Every shift therefore runs in two passes: the block is first lifted above
//! the current maximum position, then settled back at its final offset.
//!
//! Each operation is a single transaction. Dropping an uncommitted
//! transaction rolls it back, so any failure leaves the setlist untouched.
//! Reorders of the same setlist are serialised by a per-setlist async lock;
//! different setlists proceed independently.

use crate::db::{create_pool, DatabaseConfig};
use crate::error::{LibraryError, Result};
use crate::models::SetlistSong;
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, SetlistEvent};
use parking_lot::Mutex;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, instrument};

/// Position a song is parked at while its neighbours shift.
const PARKED_POSITION: i64 = 0;

/// Transactional reordering of setlist songs.
pub struct SetlistPositionManager {
    pool: SqlitePool,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    event_bus: Option<EventBus>,
}

impl SetlistPositionManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: Mutex::new(HashMap::new()),
            event_bus: None,
        }
    }

    /// Open the setlist database named by the runtime configuration and
    /// publish on its event bus.
    pub async fn open(config: &CoreConfig) -> Result<Self> {
        let pool = create_pool(DatabaseConfig::from(config)).await?;
        let mut manager = Self::new(pool);
        manager.event_bus = config.event_bus.clone();
        Ok(manager)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Publish a [`SetlistEvent`] after every committed change.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Insert `content_id` into a setlist at `position`.
    ///
    /// Positions below 1 insert at the top; positions past the end append.
    /// Songs at or after the target position move down by one.
    ///
    /// # Errors
    /// - [`LibraryError::NotFound`] if the setlist does not exist
    /// - [`LibraryError::ReorderConflict`] if the store rejects the shift
    #[instrument(skip(self))]
    pub async fn insert_song(
        &self,
        setlist_id: &str,
        content_id: &str,
        position: i64,
    ) -> Result<SetlistSong> {
        if content_id.trim().is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "content_id".to_string(),
                message: "Content id cannot be empty".to_string(),
            });
        }

        let lock = self.lock_for(setlist_id);
        let _guard = lock.lock().await;

        let mut tx = self.pool.begin().await?;
        touch_setlist(&mut tx, setlist_id).await?;

        let count = count_songs(&mut tx, setlist_id).await?;
        let target = position.clamp(1, count + 1);
        let max = max_position(&mut tx, setlist_id).await?;
        shift_range(&mut tx, setlist_id, target, max, 1).await?;

        let song = SetlistSong::new(setlist_id, content_id, target);
        sqlx::query(
            "INSERT INTO setlist_songs (id, setlist_id, content_id, position, notes, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&song.id)
        .bind(&song.setlist_id)
        .bind(&song.content_id)
        .bind(song.position)
        .bind(&song.notes)
        .bind(song.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| LibraryError::from_reorder(setlist_id, e))?;

        tx.commit().await?;

        debug!(song_id = %song.id, position = target, "Inserted song");
        self.emit(SetlistEvent::SongInserted {
            setlist_id: setlist_id.to_string(),
            song_id: song.id.clone(),
            position: target,
        });

        Ok(song)
    }

    /// Remove a song and close the gap it leaves.
    ///
    /// Returns the removed row as it was stored.
    #[instrument(skip(self))]
    pub async fn remove_song(&self, song_id: &str) -> Result<SetlistSong> {
        let setlist_id = self.find_song(song_id).await?.setlist_id;

        let lock = self.lock_for(&setlist_id);
        let _guard = lock.lock().await;

        let mut tx = self.pool.begin().await?;
        touch_setlist(&mut tx, &setlist_id).await?;
        // Re-read under the lock; a concurrent reorder may have moved it.
        let song = fetch_song(&mut tx, song_id).await?;

        sqlx::query("DELETE FROM setlist_songs WHERE id = ?")
            .bind(song_id)
            .execute(&mut *tx)
            .await?;

        let max = max_position(&mut tx, &setlist_id).await?;
        shift_range(&mut tx, &setlist_id, song.position + 1, max, -1).await?;

        tx.commit().await?;

        debug!(position = song.position, "Removed song");
        self.emit(SetlistEvent::SongRemoved {
            setlist_id: setlist_id.clone(),
            song_id: song.id.clone(),
            position: song.position,
        });

        Ok(song)
    }

    /// Move a song to `new_position`, clamped into `1..=n`.
    ///
    /// Moving a song onto its current position is a no-op and returns the
    /// row unchanged.
    #[instrument(skip(self))]
    pub async fn move_song(&self, song_id: &str, new_position: i64) -> Result<SetlistSong> {
        let setlist_id = self.find_song(song_id).await?.setlist_id;

        let lock = self.lock_for(&setlist_id);
        let _guard = lock.lock().await;

        let mut tx = self.pool.begin().await?;
        touch_setlist(&mut tx, &setlist_id).await?;
        let mut song = fetch_song(&mut tx, song_id).await?;

        let count = count_songs(&mut tx, &setlist_id).await?;
        let from = song.position;
        let to = new_position.clamp(1, count.max(1));
        if from == to {
            return Ok(song);
        }

        set_position(&mut tx, &setlist_id, song_id, PARKED_POSITION).await?;
        if from < to {
            shift_range(&mut tx, &setlist_id, from + 1, to, -1).await?;
        } else {
            shift_range(&mut tx, &setlist_id, to, from - 1, 1).await?;
        }
        set_position(&mut tx, &setlist_id, song_id, to).await?;

        tx.commit().await?;

        debug!(from, to, "Moved song");
        self.emit(SetlistEvent::SongMoved {
            setlist_id: setlist_id.clone(),
            song_id: song.id.clone(),
            from,
            to,
        });

        song.position = to;
        Ok(song)
    }

    /// Rewrite the positions of a setlist to exactly `1..=n`, keeping the
    /// current relative order (ties broken by song id).
    ///
    /// Repairs orderings written outside this manager.
    #[instrument(skip(self))]
    pub async fn renumber(&self, setlist_id: &str) -> Result<Vec<SetlistSong>> {
        let lock = self.lock_for(setlist_id);
        let _guard = lock.lock().await;

        let mut tx = self.pool.begin().await?;
        touch_setlist(&mut tx, setlist_id).await?;

        let mut songs = sqlx::query_as::<_, SetlistSong>(
            "SELECT * FROM setlist_songs WHERE setlist_id = ? ORDER BY position ASC, id ASC",
        )
        .bind(setlist_id)
        .fetch_all(&mut *tx)
        .await?;

        if songs.is_empty() {
            tx.commit().await?;
            return Ok(songs);
        }

        let (min, max): (i64, i64) = sqlx::query_as(
            "SELECT MIN(position), MAX(position) FROM setlist_songs WHERE setlist_id = ?",
        )
        .bind(setlist_id)
        .fetch_one(&mut *tx)
        .await?;

        // Lift everything strictly above both the old maximum and n so the
        // final positions are free.
        let offset = max.max(songs.len() as i64) - min + 1;
        sqlx::query("UPDATE setlist_songs SET position = position + ? WHERE setlist_id = ?")
            .bind(offset)
            .bind(setlist_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| LibraryError::from_reorder(setlist_id, e))?;

        for (index, song) in songs.iter_mut().enumerate() {
            song.position = index as i64 + 1;
            set_position(&mut tx, setlist_id, &song.id, song.position).await?;
        }

        tx.commit().await?;
        debug!(count = songs.len(), "Renumbered setlist");

        Ok(songs)
    }

    /// Replace the performer notes attached to a song.
    pub async fn update_notes(&self, song_id: &str, notes: Option<&str>) -> Result<SetlistSong> {
        let result = sqlx::query("UPDATE setlist_songs SET notes = ? WHERE id = ?")
            .bind(notes)
            .bind(song_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("SetlistSong", song_id));
        }

        self.find_song(song_id).await
    }

    async fn find_song(&self, song_id: &str) -> Result<SetlistSong> {
        sqlx::query_as::<_, SetlistSong>("SELECT * FROM setlist_songs WHERE id = ?")
            .bind(song_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| LibraryError::not_found("SetlistSong", song_id))
    }

    fn lock_for(&self, setlist_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        // Idle locks are referenced only by the map.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(setlist_id.to_string()).or_default().clone()
    }

    fn emit(&self, event: SetlistEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Setlist(event));
        }
    }
}

/// Bump `updated_at` on the owning setlist.
///
/// Issued first in each transaction so the write lock is taken before any
/// reads, and doubles as the existence check.
async fn touch_setlist(conn: &mut SqliteConnection, setlist_id: &str) -> Result<()> {
    let result = sqlx::query("UPDATE setlists SET updated_at = ? WHERE id = ?")
        .bind(chrono::Utc::now().timestamp())
        .bind(setlist_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(LibraryError::not_found("Setlist", setlist_id));
    }
    Ok(())
}

async fn fetch_song(conn: &mut SqliteConnection, song_id: &str) -> Result<SetlistSong> {
    sqlx::query_as::<_, SetlistSong>("SELECT * FROM setlist_songs WHERE id = ?")
        .bind(song_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| LibraryError::not_found("SetlistSong", song_id))
}

async fn count_songs(conn: &mut SqliteConnection, setlist_id: &str) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM setlist_songs WHERE setlist_id = ?")
        .bind(setlist_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

async fn max_position(conn: &mut SqliteConnection, setlist_id: &str) -> Result<i64> {
    let (max,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(MAX(position), 0) FROM setlist_songs WHERE setlist_id = ?",
    )
    .bind(setlist_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(max)
}

async fn set_position(
    conn: &mut SqliteConnection,
    setlist_id: &str,
    song_id: &str,
    position: i64,
) -> Result<()> {
    sqlx::query("UPDATE setlist_songs SET position = ? WHERE id = ?")
        .bind(position)
        .bind(song_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| LibraryError::from_reorder(setlist_id, e))?;
    Ok(())
}

/// Shift every song with a position in `lo..=hi` by `delta`.
///
/// The destination range must be free apart from the rows being shifted.
async fn shift_range(
    conn: &mut SqliteConnection,
    setlist_id: &str,
    lo: i64,
    hi: i64,
    delta: i64,
) -> Result<()> {
    if lo > hi {
        return Ok(());
    }

    // Above every current position, so the lifted block cannot collide.
    let offset = max_position(conn, setlist_id).await?.max(hi) + 1;

    sqlx::query(
        "UPDATE setlist_songs SET position = position + ? \
         WHERE setlist_id = ? AND position BETWEEN ? AND ?",
    )
    .bind(offset)
    .bind(setlist_id)
    .bind(lo)
    .bind(hi)
    .execute(&mut *conn)
    .await
    .map_err(|e| LibraryError::from_reorder(setlist_id, e))?;

    sqlx::query(
        "UPDATE setlist_songs SET position = position - ? + ? \
         WHERE setlist_id = ? AND position >= ?",
    )
    .bind(offset)
    .bind(delta)
    .bind(setlist_id)
    .bind(lo + offset)
    .execute(&mut *conn)
    .await
    .map_err(|e| LibraryError::from_reorder(setlist_id, e))?;

    Ok(())
}
