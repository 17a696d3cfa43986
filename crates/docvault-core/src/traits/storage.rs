//! Content store trait for pluggable blob storage backends.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// A byte stream type used for reading and uploading content.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Opaque blob storage keyed by string.
///
/// Keys carry no meaning to the store. Writers are expected to use keys
/// for which the same key always means the same bytes, which makes a
/// retried `put` after a transient failure harmless. The
/// [`ContentStore`] trait is defined here in `docvault-core` and
/// implemented in `docvault-storage`.
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Check whether the backend is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store bytes under the given key, replacing any previous object.
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> AppResult<()>;

    /// Read an object into memory. Missing keys yield a `NotFound` error.
    async fn get(&self, key: &str) -> AppResult<Bytes>;

    /// Read an object as a byte stream.
    async fn get_stream(&self, key: &str) -> AppResult<ByteStream>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether an object exists under the given key.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}
