//! Setlist repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::Setlist;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

/// Setlist repository interface
#[async_trait]
pub trait SetlistRepository: Send + Sync {
    /// Find a setlist by its ID
    ///
    /// # Returns
    /// - `Ok(Some(setlist))` if found
    /// - `Ok(None)` if not found
    async fn find_by_id(&self, id: &str) -> Result<Option<Setlist>>;

    /// Insert a new setlist
    ///
    /// # Errors
    /// Returns error if the name is blank or the ID already exists.
    async fn insert(&self, setlist: &Setlist) -> Result<()>;

    /// Rename a setlist.
    async fn rename(&self, id: &str, name: &str) -> Result<()>;

    /// Delete a setlist and, through the cascade, all of its songs.
    ///
    /// Returns `Ok(false)` if the setlist did not exist.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Count total setlists
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of SetlistRepository
pub struct SqliteSetlistRepository {
    pool: SqlitePool,
}

impl SqliteSetlistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SetlistRepository for SqliteSetlistRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Setlist>> {
        let setlist = query_as::<_, Setlist>("SELECT * FROM setlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(setlist)
    }

    async fn insert(&self, setlist: &Setlist) -> Result<()> {
        setlist
            .validate()
            .map_err(|e| LibraryError::InvalidInput {
                field: "Setlist".to_string(),
                message: e,
            })?;

        query("INSERT INTO setlists (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&setlist.id)
            .bind(&setlist.name)
            .bind(setlist.created_at)
            .bind(setlist.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn rename(&self, id: &str, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "name".to_string(),
                message: "Setlist name cannot be empty".to_string(),
            });
        }

        let result = query("UPDATE setlists SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(chrono::Utc::now().timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Setlist", id));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = query("DELETE FROM setlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) FROM setlists")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }
}
