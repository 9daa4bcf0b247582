use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use lfst_types::{Oid, RepoId};

use crate::error::LedgerResult;
use crate::traits::AccessLedger;

/// In-memory access ledger for tests and embedding.
#[derive(Default)]
pub struct InMemoryAccessLedger {
    inner: RwLock<HashMap<RepoId, HashSet<Oid>>>,
}

impl InMemoryAccessLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total association records across all repositories.
    pub fn total(&self) -> usize {
        self.inner
            .read()
            .expect("lock poisoned")
            .values()
            .map(HashSet::len)
            .sum()
    }
}

#[async_trait]
impl AccessLedger for InMemoryAccessLedger {
    async fn has_association(&self, repo: &RepoId, oid: &Oid) -> LedgerResult<bool> {
        let map = self.inner.read().expect("lock poisoned");
        Ok(map.get(repo).is_some_and(|oids| oids.contains(oid)))
    }

    async fn associate(&self, repo: &RepoId, oid: &Oid) -> LedgerResult<bool> {
        let mut map = self.inner.write().expect("lock poisoned");
        Ok(map.entry(repo.clone()).or_default().insert(*oid))
    }

    async fn remove(&self, repo: &RepoId, oid: &Oid) -> LedgerResult<bool> {
        let mut map = self.inner.write().expect("lock poisoned");
        Ok(map.get_mut(repo).is_some_and(|oids| oids.remove(oid)))
    }

    async fn count(&self, repo: &RepoId) -> LedgerResult<u64> {
        let map = self.inner.read().expect("lock poisoned");
        Ok(map.get(repo).map_or(0, |oids| oids.len() as u64))
    }
}

impl std::fmt::Debug for InMemoryAccessLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAccessLedger")
            .field("associations", &self.total())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str) -> RepoId {
        RepoId::new(name).unwrap()
    }

    #[tokio::test]
    async fn associate_is_idempotent() {
        let ledger = InMemoryAccessLedger::new();
        let oid = Oid::from_bytes(b"object");
        assert!(ledger.associate(&repo("a/one.git"), &oid).await.unwrap());
        assert!(!ledger.associate(&repo("a/one.git"), &oid).await.unwrap());
        assert_eq!(ledger.count(&repo("a/one.git")).await.unwrap(), 1);
        assert_eq!(ledger.total(), 1);
    }

    #[tokio::test]
    async fn associations_are_per_repository() {
        let ledger = InMemoryAccessLedger::new();
        let oid = Oid::from_bytes(b"shared");
        ledger.associate(&repo("a/one.git"), &oid).await.unwrap();
        assert!(ledger.has_association(&repo("a/one.git"), &oid).await.unwrap());
        assert!(!ledger.has_association(&repo("b/two.git"), &oid).await.unwrap());
        assert_eq!(ledger.count(&repo("b/two.git")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn remove_association() {
        let ledger = InMemoryAccessLedger::new();
        let oid = Oid::from_bytes(b"x");
        let r = repo("a/one.git");
        assert!(!ledger.remove(&r, &oid).await.unwrap());
        ledger.associate(&r, &oid).await.unwrap();
        assert!(ledger.remove(&r, &oid).await.unwrap());
        assert!(!ledger.has_association(&r, &oid).await.unwrap());
    }
}
