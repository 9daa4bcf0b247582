use async_trait::async_trait;
use lfst_types::{Oid, RepoId};

use crate::error::LedgerResult;

/// Repository ↔ object association records.
#[async_trait]
pub trait AccessLedger: Send + Sync {
    /// Whether `repo` is associated with `oid`.
    async fn has_association(&self, repo: &RepoId, oid: &Oid) -> LedgerResult<bool>;

    /// Record that `repo` may use `oid`.
    ///
    /// Idempotent. Returns `true` if the record was newly created.
    async fn associate(&self, repo: &RepoId, oid: &Oid) -> LedgerResult<bool>;

    /// Drop an association. Returns `true` if it existed.
    ///
    /// Used when a repository is deleted or its history is pruned.
    async fn remove(&self, repo: &RepoId, oid: &Oid) -> LedgerResult<bool>;

    /// Number of objects associated with `repo`.
    async fn count(&self, repo: &RepoId) -> LedgerResult<u64>;
}
