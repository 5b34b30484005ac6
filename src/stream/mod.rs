//! Agent answer stream decoding
//!
//! The agent endpoint multiplexes answer text, a citation block and the
//! conversation id onto one newline-delimited text stream:
//! - plain lines - answer text, concatenated without the newlines
//! - `CONVERSATION_ID: <id>` - conversation the answer belongs to
//! - `SOURCES:` - subsequent lines form a JSON array of `{source, page}`
//!
//! # Module structure
//! - `text` - incremental UTF-8 decoding of transport chunks
//! - `line` - line classification and control prefixes
//! - `decoder` - the stateful snapshot decoder
//! - `coalescer` - frame-rate throttling of snapshot deliveries

mod coalescer;
mod decoder;
mod line;
mod text;

pub use coalescer::{FrameCoalescer, SnapshotSink, DEFAULT_FRAME_INTERVAL};
pub use decoder::{DecoderMode, StreamDecoder};
pub use line::{classify_line, StreamLine, CONVERSATION_ID_PREFIX, SOURCES_PREFIX};
pub use text::Utf8ChunkDecoder;
