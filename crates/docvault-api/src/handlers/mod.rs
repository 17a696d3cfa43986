//! Request handlers.

pub mod document;
pub mod health;
pub mod version;
pub mod workflow;

use bytes::Bytes;
use futures::stream;

use docvault_core::traits::storage::ByteStream;

/// Wrap an already-buffered upload as a content stream.
pub(crate) fn byte_stream(data: Bytes) -> ByteStream {
    Box::pin(stream::once(async move { Ok::<_, std::io::Error>(data) }))
}
