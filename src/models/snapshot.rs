//! Decoded answer state delivered to consumers.

use serde::{Deserialize, Serialize};

/// A single source reference attached to an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Document name the answer drew from
    pub source: String,
    /// Page within the document
    pub page: i64,
}

impl Citation {
    pub fn new(source: impl Into<String>, page: i64) -> Self {
        Self {
            source: source.into(),
            page,
        }
    }
}

/// Point-in-time view of a streaming answer.
///
/// `text` only ever grows within one stream. `citations` stays empty until the
/// whole citation block has been received and parsed, and `conversation_id`
/// is set at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Answer text accumulated so far
    pub text: String,
    /// Parsed citation list, empty until complete
    pub citations: Vec<Citation>,
    /// Conversation the answer belongs to, once announced
    pub conversation_id: Option<String>,
}

impl Snapshot {
    /// True when nothing has been decoded yet.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.citations.is_empty() && self.conversation_id.is_none()
    }

    /// True once the citation block has been committed.
    pub fn has_citations(&self) -> bool {
        !self.citations.is_empty()
    }
}
