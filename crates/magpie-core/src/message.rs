//! Message segment model and plain-text extraction
//!
//! Inbound group messages arrive as an ordered list of segments. Handler
//! logic works almost entirely on the text segments; `plain_text` joins
//! them the same way everywhere so commands like "/rank" match regardless
//! of how the platform split the message.

use serde::{Deserialize, Serialize};

/// Joiner inserted between text segments when flattening to plain text
pub const DEFAULT_SEGMENT_JOINER: &str = " ";

/// One segment of a group message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text
    Text { text: String },
    /// Image referenced by URL
    Image { url: Option<String> },
    /// Mention of a user
    At { user_id: i64 },
    /// Segment kind this pipeline does not interpret (stickers, replies, ...)
    #[serde(other)]
    Unsupported,
}

impl Segment {
    /// Create a text segment
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    /// Create an image segment
    pub fn image(url: impl Into<String>) -> Self {
        Segment::Image {
            url: Some(url.into()),
        }
    }

    /// Create a mention segment
    pub fn at(user_id: i64) -> Self {
        Segment::At { user_id }
    }

    /// Returns true for text segments
    pub fn is_text(&self) -> bool {
        matches!(self, Segment::Text { .. })
    }
}

/// Flatten segments to plain text.
///
/// Text segments are joined with a single space; every other segment kind
/// contributes nothing. The result is trimmed so a message that is one text
/// segment round-trips to exactly its content.
pub fn plain_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(DEFAULT_SEGMENT_JOINER)
        .trim()
        .to_string()
}
