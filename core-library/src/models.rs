//! Domain models for setlists
//!
//! Rows map directly onto the `setlists` and `setlist_songs` tables.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub use bridge_traits::content::{ContentKind, SongRef};

/// An ordered collection of content items for a performance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Setlist {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Setlist {
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Setlist name cannot be empty".to_string());
        }
        Ok(())
    }
}

/// A content item placed at a position within a setlist.
///
/// Within a setlist, positions are unique and form `1..=n` after every
/// committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SetlistSong {
    pub id: String,
    pub setlist_id: String,
    pub content_id: String,
    pub position: i64,
    pub notes: Option<String>,
    pub created_at: i64,
}

impl SetlistSong {
    pub fn new(setlist_id: impl Into<String>, content_id: impl Into<String>, position: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            setlist_id: setlist_id.into(),
            content_id: content_id.into(),
            position,
            notes: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Returns `true` if `positions` (in display order) is exactly `1..=n`.
pub fn is_dense(positions: &[i64]) -> bool {
    positions
        .iter()
        .enumerate()
        .all(|(i, &p)| p == i as i64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_setlist() {
        let setlist = Setlist::new("Friday at the Blue Note");
        assert!(Uuid::parse_str(&setlist.id).is_ok());
        assert!(setlist.validate().is_ok());
        assert_eq!(setlist.created_at, setlist.updated_at);
    }

    #[test]
    fn test_blank_setlist_name_is_invalid() {
        assert!(Setlist::new("   ").validate().is_err());
    }

    #[test]
    fn test_song_with_notes() {
        let song = SetlistSong::new("s1", "c1", 3).with_notes("capo 2");
        assert_eq!(song.position, 3);
        assert_eq!(song.notes.as_deref(), Some("capo 2"));
    }

    #[test]
    fn test_is_dense() {
        assert!(is_dense(&[]));
        assert!(is_dense(&[1, 2, 3]));
        assert!(!is_dense(&[1, 3]));
        assert!(!is_dense(&[0, 1, 2]));
        assert!(!is_dense(&[1, 1, 2]));
    }
}
