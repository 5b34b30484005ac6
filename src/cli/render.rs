//! Terminal output for streamed answers.

use crate::models::Snapshot;

/// Tracks how much of the answer has been written so each update only
/// prints the new suffix.
#[derive(Debug, Default)]
pub struct AnswerPrinter {
    printed: usize,
}

impl AnswerPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text added since the previous call.
    ///
    /// Answer text only grows within a stream; if it ever did not, nothing is
    /// returned rather than reprinting.
    pub fn delta<'a>(&mut self, snapshot: &'a Snapshot) -> &'a str {
        match snapshot.text.get(self.printed..) {
            Some(rest) => {
                self.printed = snapshot.text.len();
                rest
            }
            None => "",
        }
    }
}

/// Footer printed after the answer: sources, then the conversation id.
pub fn format_footer(snapshot: &Snapshot) -> String {
    let mut footer = String::new();

    if snapshot.has_citations() {
        footer.push_str("\nSources:\n");
        for citation in &snapshot.citations {
            footer.push_str(&format!("  - {} (p. {})\n", citation.source, citation.page));
        }
    }

    if let Some(id) = &snapshot.conversation_id {
        footer.push_str(&format!("\nConversation: {}\n", id));
    }

    footer
}
