//! Reads selected files and encodes them for inline request parts.

use crate::error::EncodeError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use shared::attachment::{Attachment, EncodedAttachment};
use std::path::Path;

/// Base64 of the whole file at `path`.
pub async fn encode_file(path: &Path) -> Result<String, EncodeError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| EncodeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(BASE64.encode(bytes))
}

pub async fn encode_attachment(attachment: &Attachment) -> Result<EncodedAttachment, EncodeError> {
    let data = encode_file(&attachment.path).await?;
    tracing::debug!(
        file = %attachment.path.display(),
        mime_type = %attachment.mime_type,
        encoded_len = data.len(),
        "encoded attachment"
    );
    Ok(EncodedAttachment {
        mime_type: attachment.mime_type.clone(),
        data,
    })
}
