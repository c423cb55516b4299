//! Builds the optimizer request from the session input and sends it.

use crate::encoder::encode_attachment;
use crate::error::OptimizeError;
use crate::gemini::{Content, ContentGenerator, GenerateRequest, GenerationConfig, InlineData, Part};
use async_trait::async_trait;
use futures::future::try_join_all;
use shared::attachment::SessionInput;
use shared::settings::DEFAULT_TEMPERATURE;
use std::sync::Arc;

pub const SYSTEM_INSTRUCTION: &str = "You are Lyra, a master-level AI prompt optimization specialist.
Use the 4-D methodology (Deconstruct, Diagnose, Develop, Deliver) to analyze the provided inputs.
If the input includes images, audio, or documents, first interpret their content before crafting the optimized prompt.
The final output must be in the following format and nothing else:
**Optimized Prompt:** [The optimized prompt]

**Implementation Notes:** [The implementation notes]";

pub const EMPTY_TEXT_PLACEHOLDER: &str = "No text input provided.";

/// Turns a session input into the model's raw response text.
#[async_trait]
pub trait PromptOptimizer: Send + Sync {
    async fn optimize(&self, input: &SessionInput) -> Result<String, OptimizeError>;
}

/// Text part: user text followed by a label for each present attachment.
pub fn request_text(input: &SessionInput) -> String {
    let user_text = if input.text.is_empty() {
        EMPTY_TEXT_PLACEHOLDER
    } else {
        input.text.as_str()
    };
    let mut text = format!("User Input:\n{}", user_text);
    for (kind, _) in input.attachments() {
        text.push_str(kind.request_label());
    }
    text
}

pub struct LyraOptimizer {
    generator: Arc<dyn ContentGenerator>,
    temperature: f32,
}

impl LyraOptimizer {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self {
            generator,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Encode every attachment and assemble the request body.
    ///
    /// Files are read concurrently; parts keep the image, document, audio order.
    pub async fn build_request(&self, input: &SessionInput) -> Result<GenerateRequest, OptimizeError> {
        let encoded = try_join_all(input.attachments().map(|(_, a)| encode_attachment(a))).await?;

        let mut parts = Vec::with_capacity(1 + encoded.len());
        parts.push(Part::Text(request_text(input)));
        parts.extend(encoded.into_iter().map(|e| {
            Part::InlineData(InlineData {
                mime_type: e.mime_type,
                data: e.data,
            })
        }));

        Ok(GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text(SYSTEM_INSTRUCTION.to_string())],
            }),
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        })
    }
}

#[async_trait]
impl PromptOptimizer for LyraOptimizer {
    async fn optimize(&self, input: &SessionInput) -> Result<String, OptimizeError> {
        let request = self.build_request(input).await?;
        tracing::debug!(parts = request.contents[0].parts.len(), "built optimizer request");
        let text = self.generator.generate(&request).await?;
        tracing::debug!(chars = text.len(), "optimizer response received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncodeError;
    use parking_lot::Mutex;
    use shared::attachment::{Attachment, AttachmentKind};
    use std::fs;
    use std::path::Path;

    struct RecordingGenerator {
        reply: Result<String, u16>,
        seen: Mutex<Vec<GenerateRequest>>,
    }

    impl RecordingGenerator {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ContentGenerator for RecordingGenerator {
        async fn generate(&self, request: &GenerateRequest) -> Result<String, OptimizeError> {
            self.seen.lock().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(OptimizeError::Service {
                    status: *status,
                    body: String::new(),
                }),
            }
        }
    }

    fn attach(input: &mut SessionInput, kind: AttachmentKind, dir: &Path, name: &str, bytes: &[u8]) {
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        input.set_attachment(kind, Some(Attachment::for_slot(kind, path).unwrap()));
    }

    #[test]
    fn test_request_text_placeholder() {
        assert_eq!(
            request_text(&SessionInput::new("")),
            "User Input:\nNo text input provided."
        );
    }

    #[tokio::test]
    async fn test_text_only_request() {
        let generator = RecordingGenerator::replying("ok");
        let optimizer = LyraOptimizer::new(generator.clone());

        let text = optimizer.optimize(&SessionInput::new("Summarize this.")).await.unwrap();
        assert_eq!(text, "ok");

        let seen = generator.seen.lock();
        assert_eq!(seen.len(), 1);
        let req = &seen[0];
        assert_eq!(req.contents.len(), 1);
        assert_eq!(req.contents[0].role.as_deref(), Some("user"));
        assert_eq!(req.contents[0].parts, vec![Part::Text("User Input:\nSummarize this.".into())]);
        assert_eq!(
            req.system_instruction.as_ref().unwrap().parts,
            vec![Part::Text(SYSTEM_INSTRUCTION.into())]
        );
        assert_eq!(req.generation_config.temperature, 0.35);
    }

    #[tokio::test]
    async fn test_attachments_follow_fixed_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = SessionInput::new("");
        attach(&mut input, AttachmentKind::Audio, dir.path(), "voice.mp3", b"mp3");
        attach(&mut input, AttachmentKind::Image, dir.path(), "shot.png", b"png");
        attach(&mut input, AttachmentKind::Document, dir.path(), "brief.pdf", b"pdf");

        let optimizer = LyraOptimizer::new(RecordingGenerator::replying("ok")).with_temperature(0.5);
        let req = optimizer.build_request(&input).await.unwrap();
        let parts = &req.contents[0].parts;

        assert_eq!(
            parts[0],
            Part::Text(
                "User Input:\nNo text input provided.\n\nImage Input (if provided):\n\nDocument Input (if provided):\n\nAudio Input (if provided):"
                    .into()
            )
        );
        let mimes: Vec<&str> = parts[1..]
            .iter()
            .map(|p| match p {
                Part::InlineData(d) => d.mime_type.as_str(),
                Part::Text(_) => panic!("unexpected text part"),
            })
            .collect();
        assert_eq!(mimes, vec!["image/png", "application/pdf", "audio/mpeg"]);
        assert_eq!(
            parts[1],
            Part::InlineData(InlineData {
                mime_type: "image/png".into(),
                data: "cG5n".into(),
            })
        );
        assert_eq!(req.generation_config.temperature, 0.5);
    }

    #[tokio::test]
    async fn test_only_present_attachments_are_labelled() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = SessionInput::new("Describe the tone.");
        attach(&mut input, AttachmentKind::Audio, dir.path(), "clip.wav", b"wav");

        let optimizer = LyraOptimizer::new(RecordingGenerator::replying("ok"));
        let req = optimizer.build_request(&input).await.unwrap();
        assert_eq!(req.contents[0].parts.len(), 2);
        assert_eq!(
            req.contents[0].parts[0],
            Part::Text("User Input:\nDescribe the tone.\n\nAudio Input (if provided):".into())
        );
    }

    #[tokio::test]
    async fn test_unreadable_attachment_skips_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = SessionInput::new("hi");
        attach(&mut input, AttachmentKind::Image, dir.path(), "gone.png", b"png");
        fs::remove_file(dir.path().join("gone.png")).unwrap();

        let generator = RecordingGenerator::replying("ok");
        let optimizer = LyraOptimizer::new(generator.clone());
        let err = optimizer.optimize(&input).await.unwrap_err();

        assert!(matches!(err, OptimizeError::Encode(EncodeError::Read { .. })));
        assert!(generator.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_service_error_is_returned() {
        let optimizer = LyraOptimizer::new(RecordingGenerator::failing(429));
        let err = optimizer.optimize(&SessionInput::new("hi")).await.unwrap_err();
        assert!(matches!(err, OptimizeError::Service { status: 429, .. }));
        assert!(err.user_message().starts_with("Error: Failed to optimize prompt."));
    }
}
