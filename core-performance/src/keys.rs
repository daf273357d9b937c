//! Keyboard input

use serde::{Deserialize, Serialize};

/// A key press as seen by the navigator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavKey {
    ArrowRight,
    ArrowLeft,
    Escape,
    Other(String),
}

impl NavKey {
    /// Parse a DOM `KeyboardEvent.key` value.
    ///
    /// Legacy names (`Right`, `Left`, `Esc`) are accepted.
    pub fn from_key_name(name: &str) -> Self {
        match name {
            "ArrowRight" | "Right" => NavKey::ArrowRight,
            "ArrowLeft" | "Left" => NavKey::ArrowLeft,
            "Escape" | "Esc" => NavKey::Escape,
            other => NavKey::Other(other.to_string()),
        }
    }
}

impl From<&str> for NavKey {
    fn from(name: &str) -> Self {
        NavKey::from_key_name(name)
    }
}
