//! Stateful decoder turning text chunks into answer snapshots.
//!
//! Chunk boundaries are arbitrary: a control line or a piece of citation JSON
//! may be split across any number of chunks. The decoder keeps the unfinished
//! tail of the last chunk and only classifies a line once its newline has
//! arrived (or the stream ends).

use crate::models::{Citation, Snapshot};

use super::line::{classify_line, StreamLine};

/// Which region of the stream is currently being accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderMode {
    /// Plain answer text
    #[default]
    Text,
    /// Raw citation JSON following a `SOURCES:` line
    CitationsBuffering,
}

/// Single-pass decoder for one answer stream.
///
/// Create one per request. `finish` consumes the decoder so it cannot be
/// reused for another stream.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    mode: DecoderMode,
    /// Answer text, lines concatenated without separators
    text: String,
    /// Raw citation JSON received so far
    citation_buffer: String,
    /// Committed citation list
    citations: Option<Vec<Citation>>,
    conversation_id: Option<String>,
    /// Characters after the last newline, not yet a complete line
    pending_fragment: String,
}

impl StreamDecoder {
    /// Create a decoder for a new stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current protocol region.
    pub fn mode(&self) -> DecoderMode {
        self.mode
    }

    /// Feed the next chunk and return the state after incorporating it.
    ///
    /// Chunks must be fed in the order they were received.
    pub fn feed(&mut self, chunk: &str) -> Snapshot {
        if chunk.is_empty() {
            return self.snapshot();
        }

        let mut combined = std::mem::take(&mut self.pending_fragment);
        combined.push_str(chunk);

        match combined.rfind('\n') {
            Some(pos) => {
                let (complete, rest) = combined.split_at(pos);
                self.pending_fragment = rest[1..].to_string();
                for line in complete.split('\n') {
                    self.process_line(line);
                }
            }
            None => self.pending_fragment = combined,
        }

        self.snapshot()
    }

    /// End of stream: process the unfinished last line and return the final state.
    ///
    /// A citation block that never parsed is dropped silently.
    pub fn finish(mut self) -> Snapshot {
        if !self.pending_fragment.is_empty() {
            let line = std::mem::take(&mut self.pending_fragment);
            self.process_line(&line);
        }

        if self.mode == DecoderMode::CitationsBuffering {
            tracing::debug!(
                buffered = self.citation_buffer.len(),
                "Citation block never completed, dropping it"
            );
        }

        self.snapshot()
    }

    /// Snapshot of the current state without consuming input.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.text.clone(),
            citations: self.citations.clone().unwrap_or_default(),
            conversation_id: self.conversation_id.clone(),
        }
    }

    fn process_line(&mut self, line: &str) {
        match classify_line(line) {
            StreamLine::ConversationId(id) => {
                if self.conversation_id.is_none() && !id.is_empty() {
                    tracing::debug!(conversation_id = %id, "Conversation id announced");
                    self.conversation_id = Some(id.to_string());
                }
            }
            StreamLine::SourcesMarker => {
                // The citation block is terminal; a second one would break finality
                if self.citations.is_none() {
                    self.mode = DecoderMode::CitationsBuffering;
                }
            }
            StreamLine::Content(content) => match self.mode {
                DecoderMode::CitationsBuffering => self.buffer_citation_line(content),
                DecoderMode::Text => self.text.push_str(content),
            },
        }
    }

    fn buffer_citation_line(&mut self, line: &str) {
        self.citation_buffer.push_str(line);

        // A complete JSON array always ends with ']'
        if !self.citation_buffer.trim_end().ends_with(']') {
            return;
        }

        match serde_json::from_str::<Vec<Citation>>(&self.citation_buffer) {
            Ok(citations) => {
                tracing::debug!(count = citations.len(), "Citation block committed");
                self.citations = Some(citations);
                self.citation_buffer.clear();
                self.mode = DecoderMode::Text;
            }
            Err(e) => {
                tracing::trace!(error = %e, "Citation block incomplete, still buffering");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "Hello \nworld\nCONVERSATION_ID: abc123\nSOURCES:\n[{\"source\":\"doc.pdf\",\"page\":2}]";

    fn expected_example() -> Snapshot {
        Snapshot {
            text: "Hello world".to_string(),
            citations: vec![Citation::new("doc.pdf", 2)],
            conversation_id: Some("abc123".to_string()),
        }
    }

    /// Feed `input` in pieces of `size` characters and finish.
    fn decode_in_chunks(input: &str, size: usize) -> Snapshot {
        let mut decoder = StreamDecoder::new();
        let chars: Vec<char> = input.chars().collect();
        for piece in chars.chunks(size) {
            let chunk: String = piece.iter().collect();
            decoder.feed(&chunk);
        }
        decoder.finish()
    }

    #[test]
    fn test_example_fed_at_once() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(EXAMPLE);
        assert_eq!(decoder.finish(), expected_example());
    }

    #[test]
    fn test_example_fed_one_char_at_a_time() {
        assert_eq!(decode_in_chunks(EXAMPLE, 1), expected_example());
    }

    #[test]
    fn test_chunk_size_does_not_change_result() {
        let whole = decode_in_chunks(EXAMPLE, EXAMPLE.len());
        for size in [2, 3, 5, 7, 13, 30] {
            assert_eq!(decode_in_chunks(EXAMPLE, size), whole, "chunk size {}", size);
        }
    }

    #[test]
    fn test_backend_shaped_stream() {
        // Pretty-printed citations followed by an unterminated id line
        let input = "The fix is to clone the Arc.\n\nSOURCES:\n[\n  {\n    \"source\": \"rust.pdf\",\n    \"page\": 12\n  },\n  {\n    \"source\": \"tokio.pdf\",\n    \"page\": 4\n  }\n]\n\nCONVERSATION_ID: 77";

        let snapshot = decode_in_chunks(input, 4);
        assert_eq!(snapshot.text, "The fix is to clone the Arc.");
        assert_eq!(
            snapshot.citations,
            vec![Citation::new("rust.pdf", 12), Citation::new("tokio.pdf", 4)]
        );
        assert_eq!(snapshot.conversation_id, Some("77".to_string()));
    }

    #[test]
    fn test_newlines_in_answer_are_elided() {
        let mut decoder = StreamDecoder::new();
        let snapshot = decoder.feed("first\nsecond\n\nthird\n");
        assert_eq!(snapshot.text, "firstsecondthird");
    }

    #[test]
    fn test_incomplete_line_is_held_back() {
        let mut decoder = StreamDecoder::new();
        let snapshot = decoder.feed("Hel");
        assert_eq!(snapshot.text, "");

        let snapshot = decoder.feed("lo\nwor");
        assert_eq!(snapshot.text, "Hello");

        assert_eq!(decoder.finish().text, "Helloworld");
    }

    #[test]
    fn test_empty_chunk_does_not_change_snapshot() {
        let mut decoder = StreamDecoder::new();
        let before = decoder.feed("partial answer\nCONVERSATION_ID: 9\nmore");
        let after = decoder.feed("");
        assert_eq!(before, after);
        assert_eq!(decoder.finish().text, "partial answermore");
    }

    #[test]
    fn test_empty_chunk_on_fresh_decoder() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed("").is_empty());
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_control_prefix_split_across_chunks() {
        let mut decoder = StreamDecoder::new();
        decoder.feed("answer\nCONVERSA");
        decoder.feed("TION_");
        let snapshot = decoder.feed("ID: split-42\n");
        assert_eq!(snapshot.conversation_id, Some("split-42".to_string()));
        assert_eq!(snapshot.text, "answer");
    }

    #[test]
    fn test_only_first_conversation_id_is_kept() {
        let mut decoder = StreamDecoder::new();
        decoder.feed("CONVERSATION_ID: first\n");
        let snapshot = decoder.feed("CONVERSATION_ID: second\n");
        assert_eq!(snapshot.conversation_id, Some("first".to_string()));
        assert_eq!(snapshot.text, "");
    }

    #[test]
    fn test_blank_conversation_id_is_ignored() {
        let mut decoder = StreamDecoder::new();
        decoder.feed("CONVERSATION_ID:   \n");
        let snapshot = decoder.feed("CONVERSATION_ID: 5\n");
        assert_eq!(snapshot.conversation_id, Some("5".to_string()));
    }

    #[test]
    fn test_conversation_id_inside_citation_block() {
        let mut decoder = StreamDecoder::new();
        decoder.feed("SOURCES:\n[{\"source\":\"a.pdf\",\n");
        decoder.feed("CONVERSATION_ID: 3\n");
        let snapshot = decoder.feed("\"page\":1}]\n");
        assert_eq!(snapshot.conversation_id, Some("3".to_string()));
        assert_eq!(snapshot.citations, vec![Citation::new("a.pdf", 1)]);
    }

    #[test]
    fn test_citations_stay_empty_until_complete() {
        let mut decoder = StreamDecoder::new();
        decoder.feed("answer\nSOURCES:\n");
        assert_eq!(decoder.mode(), DecoderMode::CitationsBuffering);

        let snapshot = decoder.feed("[{\"source\": \"x.pdf\", \"page\": 1}, \n");
        assert!(snapshot.citations.is_empty());

        let snapshot = decoder.feed("{\"source\": \"y.pdf\", \"page\": 2}]\n");
        assert_eq!(snapshot.citations.len(), 2);
        assert_eq!(decoder.mode(), DecoderMode::Text);
    }

    #[test]
    fn test_citation_payload_is_not_answer_text() {
        let mut decoder = StreamDecoder::new();
        let snapshot = decoder.feed("answer\nSOURCES:\n[]\n");
        assert_eq!(snapshot.text, "answer");
        assert!(snapshot.citations.is_empty());
        assert_eq!(decoder.mode(), DecoderMode::Text);
    }

    #[test]
    fn test_text_after_citations_resumes() {
        let mut decoder = StreamDecoder::new();
        let snapshot = decoder.feed("a\nSOURCES:\n[{\"source\":\"s\",\"page\":1}]\ntrailer\n");
        assert_eq!(snapshot.text, "atrailer");
    }

    #[test]
    fn test_committed_citations_never_change() {
        let mut decoder = StreamDecoder::new();
        let committed = decoder
            .feed("SOURCES:\n[{\"source\":\"first.pdf\",\"page\":1}]\n")
            .citations;
        assert_eq!(committed.len(), 1);

        let snapshot = decoder.feed("SOURCES:\n[{\"source\":\"second.pdf\",\"page\":2}]\n");
        assert_eq!(snapshot.citations, committed);
        // The second block is ordinary text now
        assert!(snapshot.text.contains("second.pdf"));
        assert_eq!(decoder.finish().citations, committed);
    }

    #[test]
    fn test_malformed_citations_degrade_to_empty() {
        let mut decoder = StreamDecoder::new();
        decoder.feed("answer\nSOURCES:\n[{\"source\": \"x.pdf\", \"page\": \n");
        decoder.feed("not json at all]\n");
        let snapshot = decoder.finish();
        assert_eq!(snapshot.text, "answer");
        assert!(snapshot.citations.is_empty());
    }

    #[test]
    fn test_wrong_shape_citations_keep_buffering() {
        let mut decoder = StreamDecoder::new();
        let snapshot = decoder.feed("SOURCES:\n[\"just a string\"]\n");
        assert!(snapshot.citations.is_empty());
        assert_eq!(decoder.mode(), DecoderMode::CitationsBuffering);
    }

    #[test]
    fn test_unterminated_citations_flushed_at_finish() {
        let mut decoder = StreamDecoder::new();
        let snapshot = decoder.feed("SOURCES:\n[{\"source\":\"z.pdf\",\"page\":8}]");
        assert!(snapshot.citations.is_empty());
        assert_eq!(decoder.finish().citations, vec![Citation::new("z.pdf", 8)]);
    }

    #[test]
    fn test_text_length_is_monotonic() {
        let mut decoder = StreamDecoder::new();
        let mut last_len = 0;
        for chunk in EXAMPLE.split_inclusive(|c: char| c == ' ' || c == '\n') {
            let snapshot = decoder.feed(chunk);
            assert!(snapshot.text.len() >= last_len);
            last_len = snapshot.text.len();
        }
        assert!(decoder.finish().text.len() >= last_len);
    }

    #[test]
    fn test_multibyte_text_across_chunks() {
        assert_eq!(decode_in_chunks("héllo wörld ✓\nnext", 1).text, "héllo wörld ✓next");
    }
}
