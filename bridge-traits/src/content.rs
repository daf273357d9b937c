//! Content Service Abstractions
//!
//! The content service owns the canonical sheet-music, tab, chord chart and
//! lyric items. The core only ever sees them as immutable [`SongRef`] views and
//! fetches their binary payloads through [`ContentService`].

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Declared type of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Engraved sheet music, usually a PDF or scanned image
    #[default]
    Sheet,
    /// Guitar/bass tablature exported as a file
    Tab,
    /// Chord chart typed into the editor
    ChordChart,
    /// Song lyrics
    Lyrics,
    /// Free-form notes
    Text,
}

impl ContentKind {
    /// File-backed kinds are rendered from a resolved URL rather than from
    /// embedded text.
    pub fn is_sheet_like(&self) -> bool {
        matches!(self, ContentKind::Sheet | ContentKind::Tab)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Sheet => "sheet",
            ContentKind::Tab => "tab",
            ContentKind::ChordChart => "chord_chart",
            ContentKind::Lyrics => "lyrics",
            ContentKind::Text => "text",
        }
    }
}

/// Immutable view of a content item as consumed by caching and navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRef {
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub remote_url: Option<String>,
    pub embedded_text: Option<String>,
    pub bpm: Option<u32>,
    #[serde(default)]
    pub kind: ContentKind,
}

impl SongRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: None,
            remote_url: None,
            embedded_text: None,
            bpm: None,
            kind: ContentKind::default(),
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    pub fn with_embedded_text(mut self, text: impl Into<String>) -> Self {
        self.embedded_text = Some(text.into());
        self
    }

    pub fn with_bpm(mut self, bpm: u32) -> Self {
        self.bpm = Some(bpm);
        self
    }

    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns `true` if there is a remote file the cache could fetch.
    pub fn has_remote_file(&self) -> bool {
        self.remote_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

/// Binary payload returned by the content service.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl FetchedContent {
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Content service trait
///
/// Implemented by the host application on top of its HTTP client and
/// database. Every call may suspend on the network.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::content::ContentService;
///
/// async fn prefetch(service: &dyn ContentService, setlist_id: &str) -> Result<()> {
///     for song in service.list_songs(setlist_id).await? {
///         let fetched = service.fetch_content_bytes(&song.id).await?;
///         println!("{} -> {} bytes", song.title, fetched.bytes.len());
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Download the binary file attached to a content item.
    async fn fetch_content_bytes(&self, content_id: &str) -> Result<FetchedContent>;

    /// List the songs of a setlist in display order.
    async fn list_songs(&self, setlist_id: &str) -> Result<Vec<SongRef>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_like_kinds() {
        assert!(ContentKind::Sheet.is_sheet_like());
        assert!(ContentKind::Tab.is_sheet_like());
        assert!(!ContentKind::ChordChart.is_sheet_like());
        assert!(!ContentKind::Lyrics.is_sheet_like());
        assert!(!ContentKind::Text.is_sheet_like());
    }

    #[test]
    fn test_song_ref_builder() {
        let song = SongRef::new("a", "Autumn Leaves")
            .with_artist("Kosma")
            .with_remote_url("http://x/a.pdf")
            .with_bpm(120)
            .with_kind(ContentKind::Tab);

        assert_eq!(song.artist.as_deref(), Some("Kosma"));
        assert!(song.has_remote_file());
        assert_eq!(song.bpm, Some(120));
        assert_eq!(song.kind, ContentKind::Tab);
    }

    #[test]
    fn test_blank_remote_url_is_not_a_file() {
        let song = SongRef::new("a", "Blank").with_remote_url("  ");
        assert!(!song.has_remote_file());
    }

    #[test]
    fn test_kind_defaults_when_missing_from_json() {
        let song: SongRef = serde_json::from_str(
            r#"{"id":"a","title":"T","artist":null,"remote_url":null,"embedded_text":"la la","bpm":null}"#,
        )
        .unwrap();
        assert_eq!(song.kind, ContentKind::Sheet);
        assert_eq!(song.embedded_text.as_deref(), Some("la la"));
    }
}
