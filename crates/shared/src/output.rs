//! Parser for the two-section optimizer response.
//!
//! The system instruction asks the model to answer as:
//!
//! ```text
//! **Optimized Prompt:** <prompt text>
//!
//! **Implementation Notes:** <notes text>
//! ```
//!
//! The format has no escaping. If the model writes the notes marker inside
//! its own content, the split happens there.

use serde::{Deserialize, Serialize};

pub const PROMPT_LABEL: &str = "**Optimized Prompt:**";
pub const NOTES_MARKER: &str = "**Implementation Notes:**";

/// Prefix used for failures that arrive as plain text.
pub const ERROR_MARKER: &str = "Error:";

/// The two rendered sections of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOutput {
    pub prompt: String,
    pub notes: String,
}

impl ParsedOutput {
    pub fn new(prompt: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            notes: notes.into(),
        }
    }

    /// Render in the layout the model is instructed to use.
    pub fn to_response_text(&self) -> String {
        format!(
            "{} {}\n\n{} {}",
            PROMPT_LABEL, self.prompt, NOTES_MARKER, self.notes
        )
    }
}

/// Split a raw response into prompt and notes.
///
/// Returns `None` when the notes marker is missing; never panics.
pub fn parse_output(raw: &str) -> Option<ParsedOutput> {
    let (before, after) = raw.split_once(NOTES_MARKER)?;
    let prompt = before.replacen(PROMPT_LABEL, "", 1);
    Some(ParsedOutput {
        prompt: prompt.trim().to_string(),
        notes: after.trim().to_string(),
    })
}

/// True for text that carries the failure prefix instead of content.
pub fn is_error_text(raw: &str) -> bool {
    raw.starts_with(ERROR_MARKER)
}
