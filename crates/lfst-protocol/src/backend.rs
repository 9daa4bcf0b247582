use async_trait::async_trait;
use lfst_types::{Oid, Operation};

use crate::args::Args;
use crate::error::TransferResult;
use crate::item::BatchItem;
use crate::status::Status;
use lfst_store::ObjectReader;

/// Byte stream returned by [`TransferBackend::download`].
///
/// The caller owns the stream; dropping it closes the underlying handle.
pub struct DownloadedObject {
    pub reader: ObjectReader,
    pub size: u64,
}

impl std::fmt::Debug for DownloadedObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadedObject")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Lock API handle.
///
/// No backend supports locking and the `locking` capability is never
/// advertised, so a conforming engine never calls into this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockBackend {
    Unsupported,
}

/// The operations the protocol engine invokes, one per command.
///
/// Realizations must agree on every externally observable outcome: the same
/// inputs succeed or fail with the same [`ErrorKind`](crate::ErrorKind), and
/// report the same `present` flags.
#[async_trait]
pub trait TransferBackend: Send + Sync {
    /// Annotate each item with whether it is already usable for `operation`.
    ///
    /// A missing or unusable item is reported through `present`, never as an
    /// error of the whole call.
    async fn batch(
        &self,
        operation: Operation,
        items: Vec<BatchItem>,
        args: &Args,
    ) -> TransferResult<Vec<BatchItem>>;

    /// Open an object for the client. `NotFound` if absent or not accessible.
    async fn download(&self, oid: &Oid, args: &Args) -> TransferResult<DownloadedObject>;

    /// Receive exactly `size` bytes for `oid`.
    ///
    /// `None` for the reader fails with `MissingData`. Size or digest
    /// mismatches fail with `CorruptData` and leave no state behind.
    async fn upload(
        &self,
        oid: &Oid,
        size: u64,
        reader: Option<ObjectReader>,
        args: &Args,
    ) -> TransferResult<()>;

    /// Confirm an object of `size` bytes is stored and accessible.
    async fn verify(&self, oid: &Oid, size: u64, args: &Args) -> TransferResult<Status>;

    fn lock_backend(&self, args: &Args) -> LockBackend;
}
