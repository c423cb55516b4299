//! Attachment slots and session input.
//!
//! A session carries free-form text plus at most one file per
//! [`AttachmentKind`]. The media type of each file is resolved from its
//! extension when it is attached, and the slot decides whether it accepts it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The three attachment slots, in the order they are sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Document,
    Audio,
}

impl AttachmentKind {
    pub fn all() -> &'static [AttachmentKind] {
        &[
            AttachmentKind::Image,
            AttachmentKind::Document,
            AttachmentKind::Audio,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "Image",
            AttachmentKind::Document => "Document",
            AttachmentKind::Audio => "Audio",
        }
    }

    /// Sub-header placed in the text part for a present attachment.
    pub fn request_label(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "\n\nImage Input (if provided):",
            AttachmentKind::Document => "\n\nDocument Input (if provided):",
            AttachmentKind::Audio => "\n\nAudio Input (if provided):",
        }
    }

    /// Whether this slot takes files of `mime_type`.
    pub fn accepts(&self, mime_type: &str) -> bool {
        match self {
            AttachmentKind::Image => mime_type.starts_with("image/"),
            AttachmentKind::Audio => mime_type.starts_with("audio/"),
            AttachmentKind::Document => DOCUMENT_TYPES.contains(&mime_type),
        }
    }

    /// Human-readable list of what the slot takes, for error messages.
    pub fn accepted_description(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "any image file",
            AttachmentKind::Document => ".pdf, .doc, .docx or .txt",
            AttachmentKind::Audio => "any audio file",
        }
    }
}

impl std::fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Document => "document",
            AttachmentKind::Audio => "audio",
        })
    }
}

const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

/// Media type for a file, from its extension.
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "svg" => Some("image/svg+xml"),
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "docx" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        "txt" => Some("text/plain"),
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "ogg" | "oga" => Some("audio/ogg"),
        "flac" => Some("audio/flac"),
        "m4a" => Some("audio/mp4"),
        "aac" => Some("audio/aac"),
        "weba" | "webm" => Some("audio/webm"),
        "aif" | "aiff" => Some("audio/aiff"),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("File not found: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("{kind} input does not accept {} (expected {})", .path.display(), .kind.accepted_description())]
    Unsupported { kind: AttachmentKind, path: PathBuf },
}

/// A selected file and its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub path: PathBuf,
    pub mime_type: String,
}

impl Attachment {
    /// Resolve `path` for the `kind` slot.
    pub fn for_slot(kind: AttachmentKind, path: impl Into<PathBuf>) -> Result<Self, AttachError> {
        let path = path.into();
        if !path.is_file() {
            return Err(AttachError::Missing { path });
        }
        match media_type_for_path(&path) {
            Some(mime) if kind.accepts(mime) => Ok(Self {
                path,
                mime_type: mime.to_string(),
            }),
            _ => Err(AttachError::Unsupported { kind, path }),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Base64 payload of one attachment, ready to embed in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAttachment {
    pub mime_type: String,
    pub data: String,
}

/// Everything the user has entered for the next request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInput {
    pub text: String,
    pub image: Option<Attachment>,
    pub document: Option<Attachment>,
    pub audio: Option<Attachment>,
}

impl SessionInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn attachment(&self, kind: AttachmentKind) -> Option<&Attachment> {
        match kind {
            AttachmentKind::Image => self.image.as_ref(),
            AttachmentKind::Document => self.document.as_ref(),
            AttachmentKind::Audio => self.audio.as_ref(),
        }
    }

    /// Put `attachment` in its slot (or clear the slot with `None`).
    pub fn set_attachment(&mut self, kind: AttachmentKind, attachment: Option<Attachment>) {
        let slot = match kind {
            AttachmentKind::Image => &mut self.image,
            AttachmentKind::Document => &mut self.document,
            AttachmentKind::Audio => &mut self.audio,
        };
        *slot = attachment;
    }

    /// Present attachments in request order: image, document, audio.
    pub fn attachments(&self) -> impl Iterator<Item = (AttachmentKind, &Attachment)> {
        AttachmentKind::all()
            .iter()
            .filter_map(move |kind| self.attachment(*kind).map(|a| (*kind, a)))
    }

    pub fn has_attachments(&self) -> bool {
        self.attachments().next().is_some()
    }

    /// A request may only be issued when there is text or a file.
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty() || self.has_attachments()
    }
}
