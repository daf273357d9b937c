//! Read access to setlist songs

use crate::error::Result;
use crate::models::SetlistSong;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

/// Setlist song repository interface
///
/// Songs are always returned in display order (ascending position).
#[async_trait]
pub trait SetlistSongRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<SetlistSong>>;

    /// All songs of a setlist in display order.
    async fn list_for_setlist(&self, setlist_id: &str) -> Result<Vec<SetlistSong>>;

    async fn count_for_setlist(&self, setlist_id: &str) -> Result<i64>;

    /// Every placement of a content item, across setlists.
    async fn find_by_content(&self, content_id: &str) -> Result<Vec<SetlistSong>>;
}

/// SQLite implementation of SetlistSongRepository
pub struct SqliteSetlistSongRepository {
    pool: SqlitePool,
}

impl SqliteSetlistSongRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SetlistSongRepository for SqliteSetlistSongRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<SetlistSong>> {
        let song = query_as::<_, SetlistSong>("SELECT * FROM setlist_songs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(song)
    }

    async fn list_for_setlist(&self, setlist_id: &str) -> Result<Vec<SetlistSong>> {
        let songs = query_as::<_, SetlistSong>(
            "SELECT * FROM setlist_songs WHERE setlist_id = ? ORDER BY position ASC",
        )
        .bind(setlist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    async fn count_for_setlist(&self, setlist_id: &str) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) FROM setlist_songs WHERE setlist_id = ?")
            .bind(setlist_id)
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }

    async fn find_by_content(&self, content_id: &str) -> Result<Vec<SetlistSong>> {
        let songs = query_as::<_, SetlistSong>(
            "SELECT * FROM setlist_songs WHERE content_id = ? ORDER BY setlist_id, position",
        )
        .bind(content_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::Setlist;
    use crate::repositories::{SetlistRepository, SqliteSetlistRepository};

    async fn seed(pool: &SqlitePool, setlist_id: &str, content_id: &str, position: i64) {
        let song = SetlistSong::new(setlist_id, content_id, position);
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
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_list_is_in_position_order() {
        let pool = create_test_pool().await.unwrap();
        let setlist = Setlist::new("Set A");
        SqliteSetlistRepository::new(pool.clone())
            .insert(&setlist)
            .await
            .unwrap();

        seed(&pool, &setlist.id, "c3", 3).await;
        seed(&pool, &setlist.id, "c1", 1).await;
        seed(&pool, &setlist.id, "c2", 2).await;

        let repo = SqliteSetlistSongRepository::new(pool);
        let songs = repo.list_for_setlist(&setlist.id).await.unwrap();
        let ids: Vec<_> = songs.iter().map(|s| s.content_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert_eq!(repo.count_for_setlist(&setlist.id).await.unwrap(), 3);

        let found = repo.find_by_id(&songs[1].id).await.unwrap().unwrap();
        assert_eq!(found.position, 2);
    }

    #[tokio::test]
    async fn test_songs_cascade_with_setlist() {
        let pool = create_test_pool().await.unwrap();
        let setlists = SqliteSetlistRepository::new(pool.clone());
        let setlist = Setlist::new("Set B");
        setlists.insert(&setlist).await.unwrap();
        seed(&pool, &setlist.id, "c1", 1).await;

        setlists.delete(&setlist.id).await.unwrap();

        let repo = SqliteSetlistSongRepository::new(pool);
        assert_eq!(repo.count_for_setlist(&setlist.id).await.unwrap(), 0);
        assert!(repo.find_by_content("c1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_position_is_rejected() {
        let pool = create_test_pool().await.unwrap();
        let setlist = Setlist::new("Set C");
        SqliteSetlistRepository::new(pool.clone())
            .insert(&setlist)
            .await
            .unwrap();
        seed(&pool, &setlist.id, "c1", 1).await;

        let dup = SetlistSong::new(&setlist.id, "c2", 1);
        let result = sqlx::query(
            "INSERT INTO setlist_songs (id, setlist_id, content_id, position, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&dup.id)
        .bind(&dup.setlist_id)
        .bind(&dup.content_id)
        .bind(dup.position)
        .bind(dup.created_at)
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }
}
