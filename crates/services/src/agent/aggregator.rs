//! Answer aggregation for collected mode

/// Live marker opening a thinking section
pub const THINKING_SECTION_MARKER: &str = "**Thoughts:**\n";
/// Separator emitted after a thinking block, and between thoughts and answer
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";
pub const THOUGHTS_LABEL: &str = "**Thoughts:**";
pub const ANSWER_LABEL: &str = "**Answer:**";

/// Accumulated thinking and answer fragments of one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Answer {
    thinking_parts: Vec<String>,
    answer_parts: Vec<String>,
}

impl Answer {
    pub fn push_thinking(&mut self, part: impl Into<String>) {
        self.thinking_parts.push(part.into());
    }

    pub fn push_answer(&mut self, part: impl Into<String>) {
        self.answer_parts.push(part.into());
    }

    fn has_thinking(&self) -> bool {
        self.thinking_parts.iter().any(|part| !part.trim().is_empty())
    }

    /// Single string for collected mode.
    ///
    /// With thinking present the result is the labelled thoughts, a rule, the
    /// answer label and then the answer; otherwise just the answer. Only the
    /// outer whitespace of the whole string is trimmed.
    pub fn compose(&self) -> String {
        let mut out = String::new();

        if self.has_thinking() {
            out.push_str(THOUGHTS_LABEL);
            out.push_str("\n\n");
            out.push_str(&self.thinking_parts.concat());
            out.push_str(SECTION_SEPARATOR);
            out.push_str(ANSWER_LABEL);
            out.push_str("\n\n");
        }

        out.push_str(&self.answer_parts.concat());
        out.trim().to_string()
    }
}
