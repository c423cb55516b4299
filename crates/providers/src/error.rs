use shared::output::ERROR_MARKER;
use std::path::PathBuf;

/// Failure turning a selected file into request bytes.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Everything that can go wrong between the session input and the model's text.
#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("No Gemini API key configured (set GEMINI_API_KEY or model.gemini_auth.api_key)")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gemini error: {status}{}", body_suffix(.body))]
    Service { status: u16, body: String },

    #[error("could not decode gemini response: {0}")]
    Decode(String),

    #[error("the model returned no text{}", reason_suffix(.reason))]
    EmptyResponse { reason: Option<String> },
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!("\n{}", body)
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(" ({})", r))
        .unwrap_or_default()
}

impl OptimizeError {
    /// Text shown to the user, always starting with the error marker.
    pub fn user_message(&self) -> String {
        format!("{} Failed to optimize prompt. {}", ERROR_MARKER, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::output::is_error_text;

    #[test]
    fn test_user_message_carries_marker() {
        let err = OptimizeError::Service {
            status: 503,
            body: "overloaded".into(),
        };
        let msg = err.user_message();
        assert!(is_error_text(&msg));
        assert_eq!(msg, "Error: Failed to optimize prompt. gemini error: 503\noverloaded");
    }

    #[test]
    fn test_empty_response_reason() {
        let err = OptimizeError::EmptyResponse {
            reason: Some("SAFETY".into()),
        };
        assert_eq!(err.to_string(), "the model returned no text (SAFETY)");
        let err = OptimizeError::EmptyResponse { reason: None };
        assert_eq!(err.to_string(), "the model returned no text");
    }

    #[test]
    fn test_encode_error_names_file() {
        let err = OptimizeError::from(EncodeError::Read {
            path: "/tmp/missing.png".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        });
        assert!(err.user_message().contains("/tmp/missing.png"));
    }
}
