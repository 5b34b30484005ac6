//! Incremental UTF-8 decoding of transport chunks.
//!
//! The transport hands out raw byte chunks that may end in the middle of a
//! multi-byte character. Incomplete trailing sequences are carried over to the
//! next chunk; invalid sequences become U+FFFD.

/// Streaming UTF-8 decoder for one response body.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    /// Bytes of an incomplete character from the previous chunk
    carry: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, holding back an incomplete trailing character.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.carry);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            // Sequence cut off by the chunk boundary
                            self.carry = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// End of body: whatever is still carried is a truncated character.
    pub fn finish(self) -> String {
        if self.carry.is_empty() {
            String::new()
        } else {
            String::from_utf8_lossy(&self.carry).into_owned()
        }
    }
}
