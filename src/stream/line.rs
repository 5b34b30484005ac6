//! Line classification for the agent answer stream.
//!
//! Each complete line of the stream is one of:
//! - `CONVERSATION_ID: <id>` - conversation the answer belongs to
//! - `SOURCES:` - the following lines carry a JSON citation array
//! - anything else - answer text, or citation JSON while a block is open

/// Prefix of the line announcing the conversation id.
pub const CONVERSATION_ID_PREFIX: &str = "CONVERSATION_ID:";

/// Prefix of the line opening the citation block.
pub const SOURCES_PREFIX: &str = "SOURCES:";

/// A classified stream line, borrowing from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamLine<'a> {
    /// Conversation id, surrounding whitespace trimmed
    ConversationId(&'a str),
    /// Start of the citation block
    SourcesMarker,
    /// Plain content line
    Content(&'a str),
}

/// Classify a single line (without its trailing newline).
///
/// Prefixes only match at the very start of the line.
pub fn classify_line(line: &str) -> StreamLine<'_> {
    if let Some(rest) = line.strip_prefix(CONVERSATION_ID_PREFIX) {
        return StreamLine::ConversationId(rest.trim());
    }

    if line.starts_with(SOURCES_PREFIX) {
        return StreamLine::SourcesMarker;
    }

    StreamLine::Content(line)
}
