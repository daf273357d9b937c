//! # Content Error Types

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors raised by the offline content cache.
///
/// A cache miss is never an error; lookups return `Ok(None)`.
#[derive(Error, Debug)]
pub enum ContentError {
    /// A single payload is larger than the whole byte ceiling.
    #[error("Entry {content_id} is {size_bytes} bytes, cache limit is {limit_bytes}")]
    EntryTooLarge {
        content_id: String,
        size_bytes: u64,
        limit_bytes: u64,
    },

    /// The backing store failed.
    #[error("Cache store error: {0}")]
    Store(String),

    /// The content service could not deliver the payload.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] BridgeError),

    #[error("Fetch of {content_id} timed out")]
    Timeout { content_id: String },

    /// The resolution session has been closed.
    #[error("Content session closed")]
    SessionClosed,

    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

impl ContentError {
    /// Returns `true` if retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ContentError::Timeout { .. } => true,
            ContentError::Fetch(e) => e.is_transient(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(ContentError::Timeout {
            content_id: "a".into()
        }
        .is_transient());
        assert!(ContentError::Fetch(BridgeError::Network("reset".into())).is_transient());
        assert!(!ContentError::Fetch(BridgeError::NotFound("a".into())).is_transient());
        assert!(!ContentError::SessionClosed.is_transient());
    }

    #[test]
    fn test_entry_too_large_message() {
        let err = ContentError::EntryTooLarge {
            content_id: "score".into(),
            size_bytes: 20,
            limit_bytes: 10,
        };
        assert_eq!(err.to_string(), "Entry score is 20 bytes, cache limit is 10");
    }
}
