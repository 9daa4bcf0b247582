use async_trait::async_trait;
use lfst_types::{Oid, Pointer};
use tokio::io::AsyncRead;

use crate::error::StoreResult;

/// Owned byte stream handed out by a store. The holder closes it by dropping.
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Global, deduplicated, content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - An object is only ever visible under the oid of its exact bytes.
/// - `put` never leaves a partial object behind, whether it fails or not.
/// - `put` of content that is already present succeeds without conflict.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Whether an object with this oid is physically present.
    async fn exists(&self, oid: &Oid) -> StoreResult<bool>;

    /// Resolve the stored pointer for `oid`, or `None` if absent.
    async fn meta(&self, oid: &Oid) -> StoreResult<Option<Pointer>>;

    /// Open the object's bytes for reading.
    ///
    /// Fails with `NotFound` if the object is absent.
    async fn get(&self, pointer: &Pointer) -> StoreResult<ObjectReader>;

    /// Store bytes read from `reader` under `pointer`.
    ///
    /// At most `pointer.size + 1` bytes are consumed. Fails with an
    /// `Integrity` error if the byte count or the SHA-256 digest differs
    /// from the pointer.
    async fn put(
        &self,
        pointer: &Pointer,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StoreResult<()>;

    /// Delete an object. Returns `true` if it existed.
    ///
    /// Garbage collection only: deleting an object other repositories still
    /// reference breaks them.
    async fn delete(&self, oid: &Oid) -> StoreResult<bool>;
}
