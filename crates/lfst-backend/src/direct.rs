//! Backend that serves objects straight from the content store.
//!
//! Objects are deduplicated across repositories, so presence in the store is
//! not enough: an object is *accessible* to the session's repository only if
//! the access ledger also associates it with that repository.

use std::sync::Arc;

use async_trait::async_trait;
use lfst_crypto::HashingReader;
use lfst_ledger::AccessLedger;
use lfst_protocol::{
    cancellable, Args, BatchItem, DownloadedObject, LockBackend, ObjectReader, Session, Status,
    TransferBackend, TransferError, TransferResult,
};
use lfst_store::ContentStore;
use lfst_types::{Oid, Operation, Pointer, RepoId};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct ContentStoreBackend {
    store: Arc<dyn ContentStore>,
    ledger: Arc<dyn AccessLedger>,
    repo: RepoId,
    cancel: CancellationToken,
}

impl ContentStoreBackend {
    pub fn new(store: Arc<dyn ContentStore>, ledger: Arc<dyn AccessLedger>, session: &Session) -> Self {
        Self {
            store,
            ledger,
            repo: session.repo.clone(),
            cancel: session.cancel.clone(),
        }
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// Present in the store and associated with this repository.
    pub async fn accessible(&self, oid: &Oid) -> TransferResult<bool> {
        if !self.store.exists(oid).await? {
            return Ok(false);
        }
        Ok(self.ledger.has_association(&self.repo, oid).await?)
    }

    async fn receive(&self, pointer: &Pointer, mut reader: ObjectReader) -> TransferResult<()> {
        let oid = &pointer.oid;
        if self.store.exists(oid).await? {
            if self.ledger.has_association(&self.repo, oid).await? {
                debug!(oid = %oid.short_hex(), "object already accessible, skipping upload");
                return Ok(());
            }

            // Stored for another repository: the client must prove it has the
            // bytes before this repository gains access.
            let mut hashing = HashingReader::new(reader.take(pointer.size.saturating_add(1)));
            tokio::io::copy(&mut hashing, &mut tokio::io::sink()).await?;
            if let Err(e) = hashing.verify(pointer) {
                warn!(oid = %oid.short_hex(), error = %e, "possession proof failed");
                return Err(e.into());
            }
        } else {
            self.store.put(pointer, &mut *reader).await?;
        }

        if self.ledger.associate(&self.repo, oid).await? {
            info!(oid = %oid.short_hex(), size = pointer.size, repo = %self.repo, "object associated");
        }
        Ok(())
    }
}

#[async_trait]
impl TransferBackend for ContentStoreBackend {
    async fn batch(
        &self,
        operation: Operation,
        mut items: Vec<BatchItem>,
        _args: &Args,
    ) -> TransferResult<Vec<BatchItem>> {
        for item in &mut items {
            item.present = match cancellable(&self.cancel, self.accessible(item.oid())).await {
                Ok(accessible) => accessible,
                Err(TransferError::Cancelled) => return Err(TransferError::Cancelled),
                Err(e) => {
                    warn!(oid = %item.oid().short_hex(), error = %e, "presence check failed");
                    false
                }
            };
        }
        debug!(%operation, count = items.len(), "batch annotated");
        Ok(items)
    }

    async fn download(&self, oid: &Oid, _args: &Args) -> TransferResult<DownloadedObject> {
        cancellable(&self.cancel, async {
            let pointer = self.store.meta(oid).await?.ok_or(TransferError::NotFound)?;
            let reader = self.store.get(&pointer).await?;
            if !self.accessible(oid).await? {
                return Err(TransferError::NotFound);
            }
            Ok(DownloadedObject {
                reader,
                size: pointer.size,
            })
        })
        .await
    }

    async fn upload(
        &self,
        oid: &Oid,
        size: u64,
        reader: Option<ObjectReader>,
        _args: &Args,
    ) -> TransferResult<()> {
        let reader = reader.ok_or_else(|| TransferError::MissingData("missing object data".into()))?;
        let pointer = Pointer::new(*oid, size);
        cancellable(&self.cancel, self.receive(&pointer, reader)).await
    }

    async fn verify(&self, oid: &Oid, size: u64, _args: &Args) -> TransferResult<Status> {
        cancellable(&self.cancel, async {
            match self.store.meta(oid).await? {
                Some(pointer) if pointer.size == size => {}
                _ => return Err(TransferError::NotFound),
            }
            if !self.ledger.has_association(&self.repo, oid).await? {
                return Err(TransferError::NotFound);
            }
            Ok(Status::success())
        })
        .await
    }

    fn lock_backend(&self, _args: &Args) -> LockBackend {
        LockBackend::Unsupported
    }
}
