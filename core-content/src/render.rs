//! # Content Render Selection
//!
//! Chooses how a resolved song should be displayed. Pure and synchronous.

use bridge_traits::content::SongRef;
use serde::{Deserialize, Serialize};

const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp"];

/// How the UI should present a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderDecision {
    /// Paged document viewer
    Document { url: String },
    Image { url: String },
    Text { body: String },
    NoContent,
    /// A file exists but its format cannot be shown
    Unsupported { url: String },
}

/// Pick a renderer for `item`.
///
/// Sheet-like items (sheets, tabs) are classified from the resolved URL's
/// extension, then from `mime_type`. Everything else shows `embedded_text`.
pub fn select(
    item: &SongRef,
    resolved_url: Option<&str>,
    mime_type: Option<&str>,
    embedded_text: Option<&str>,
) -> RenderDecision {
    if !item.kind.is_sheet_like() {
        return match embedded_text.filter(|t| !t.trim().is_empty()) {
            Some(text) => RenderDecision::Text {
                body: text.to_string(),
            },
            None => RenderDecision::NoContent,
        };
    }

    let Some(url) = resolved_url.filter(|u| !u.trim().is_empty()) else {
        return RenderDecision::NoContent;
    };

    match classify(url, mime_type) {
        FileClass::Document => RenderDecision::Document {
            url: url.to_string(),
        },
        FileClass::Image => RenderDecision::Image {
            url: url.to_string(),
        },
        FileClass::Other => RenderDecision::Unsupported {
            url: url.to_string(),
        },
    }
}

enum FileClass {
    Document,
    Image,
    Other,
}

fn classify(url: &str, mime_type: Option<&str>) -> FileClass {
    if let Some(ext) = extension(url) {
        if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            return FileClass::Document;
        }
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return FileClass::Image;
        }
    }

    let mime = mime_type
        .map(|m| m.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .unwrap_or_default();
    if mime == "application/pdf" {
        FileClass::Document
    } else if mime.starts_with("image/") {
        FileClass::Image
    } else {
        FileClass::Other
    }
}

/// Lowercased extension of the URL path, ignoring query and fragment.
fn extension(url: &str) -> Option<String> {
    let path = url.split(|c| c == '?' || c == '#').next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or_default();
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
