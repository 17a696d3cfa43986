//! SHA-256 content fingerprinting over byte streams.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use sha2::{Digest, Sha256};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::storage::ByteStream;

/// A fully drained and hashed upload.
#[derive(Debug, Clone)]
pub struct HashedContent {
    /// The content bytes.
    pub bytes: Bytes,
    /// Lowercase hex SHA-256.
    pub sha256: String,
}

impl HashedContent {
    /// Content length in bytes.
    pub fn size(&self) -> i64 {
        self.bytes.len() as i64
    }
}

/// Hash an in-memory buffer.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Drain a stream, hashing every chunk.
///
/// Fails with `InvalidContent` when the stream errors or yields no bytes,
/// and with `Validation` when it exceeds `max_bytes`.
pub async fn hash_stream(mut stream: ByteStream, max_bytes: u64) -> AppResult<HashedContent> {
    let mut hasher = Sha256::new();
    let mut buffer = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            AppError::with_source(ErrorKind::InvalidContent, "Failed to read content stream", e)
        })?;
        if (buffer.len() + chunk.len()) as u64 > max_bytes {
            return Err(AppError::validation(format!(
                "Content exceeds the maximum size of {max_bytes} bytes"
            )));
        }
        hasher.update(&chunk);
        buffer.extend_from_slice(&chunk);
    }

    if buffer.is_empty() {
        return Err(AppError::invalid_content("Content is empty"));
    }

    Ok(HashedContent {
        bytes: buffer.freeze(),
        sha256: format!("{:x}", hasher.finalize()),
    })
}
