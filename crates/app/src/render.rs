//! Terminal output for a session status.

use crate::controller::SessionStatus;
use serde_json::{json, Value};
use shared::output::parse_output;

pub const THINKING_MESSAGE: &str = "Lyra is thinking...";
pub const PLACEHOLDER_MESSAGE: &str = "Your optimized prompt will appear here.";

pub fn render_text(status: &SessionStatus) -> String {
    match status {
        SessionStatus::Idle => PLACEHOLDER_MESSAGE.to_string(),
        SessionStatus::Loading => THINKING_MESSAGE.to_string(),
        SessionStatus::Error(msg) => format!("An Error Occurred\n\n{}", msg),
        SessionStatus::Success(raw) => match parse_output(raw) {
            Some(parsed) => format!(
                "Optimized Prompt\n\n{}\n\nImplementation Notes\n\n{}",
                parsed.prompt, parsed.notes
            ),
            None => PLACEHOLDER_MESSAGE.to_string(),
        },
    }
}

pub fn render_json(status: &SessionStatus) -> Value {
    match status {
        SessionStatus::Error(msg) => json!({ "error": msg }),
        SessionStatus::Success(raw) => match parse_output(raw) {
            Some(parsed) => json!({ "prompt": parsed.prompt, "notes": parsed.notes }),
            None => json!({ "prompt": null, "notes": null, "raw": raw }),
        },
        SessionStatus::Idle | SessionStatus::Loading => json!({ "prompt": null, "notes": null }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sections() {
        let status = SessionStatus::Success(
            "**Optimized Prompt:** Do X.\n\n**Implementation Notes:** Because Y.".into(),
        );
        assert_eq!(
            render_text(&status),
            "Optimized Prompt\n\nDo X.\n\nImplementation Notes\n\nBecause Y."
        );
        assert_eq!(
            render_json(&status),
            json!({"prompt": "Do X.", "notes": "Because Y."})
        );
    }

    #[test]
    fn test_unparsable_shows_placeholder() {
        let status = SessionStatus::Success("free-form answer".into());
        assert_eq!(render_text(&status), PLACEHOLDER_MESSAGE);
        assert_eq!(render_json(&status)["raw"], "free-form answer");
    }

    #[test]
    fn test_render_error() {
        let status = SessionStatus::Error("Error: Failed to optimize prompt. timeout".into());
        assert!(render_text(&status).ends_with("Error: Failed to optimize prompt. timeout"));
        assert_eq!(
            render_json(&status),
            json!({"error": "Error: Failed to optimize prompt. timeout"})
        );
    }
}
