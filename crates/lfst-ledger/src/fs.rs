use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lfst_types::{Oid, RepoId};
use tracing::debug;

use crate::error::LedgerResult;
use crate::traits::AccessLedger;

/// Filesystem access ledger.
///
/// Each association is an empty marker file at `<root>/<owner>/<name>/<oid>`.
/// Exclusive creation makes `associate` atomic and idempotent without any
/// in-process locking.
#[derive(Debug, Clone)]
pub struct FsAccessLedger {
    root: PathBuf,
}

impl FsAccessLedger {
    pub async fn open(root: impl Into<PathBuf>) -> LedgerResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn repo_dir(&self, repo: &RepoId) -> PathBuf {
        // RepoId guarantees exactly two safe path segments.
        self.root.join(repo.as_str())
    }

    fn record_path(&self, repo: &RepoId, oid: &Oid) -> PathBuf {
        self.repo_dir(repo).join(oid.to_hex())
    }
}

#[async_trait]
impl AccessLedger for FsAccessLedger {
    async fn has_association(&self, repo: &RepoId, oid: &Oid) -> LedgerResult<bool> {
        Ok(tokio::fs::try_exists(self.record_path(repo, oid)).await?)
    }

    async fn associate(&self, repo: &RepoId, oid: &Oid) -> LedgerResult<bool> {
        tokio::fs::create_dir_all(self.repo_dir(repo)).await?;
        let created = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.record_path(repo, oid))
            .await;
        match created {
            Ok(_) => {
                debug!(%repo, %oid, "recorded association");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, repo: &RepoId, oid: &Oid) -> LedgerResult<bool> {
        match tokio::fs::remove_file(self.record_path(repo, oid)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn count(&self, repo: &RepoId) -> LedgerResult<u64> {
        let mut entries = match tokio::fs::read_dir(self.repo_dir(repo)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name.to_str().is_some_and(|n| Oid::from_hex(n).is_ok()) {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn marker_files_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FsAccessLedger::open(dir.path()).await.unwrap();
        let repo = RepoId::new("alice/assets.git").unwrap();
        let oid = Oid::from_bytes(b"asset");

        assert!(!ledger.has_association(&repo, &oid).await.unwrap());
        assert!(ledger.associate(&repo, &oid).await.unwrap());
        assert!(!ledger.associate(&repo, &oid).await.unwrap());
        assert!(ledger.has_association(&repo, &oid).await.unwrap());
        assert!(dir.path().join("alice/assets.git").join(oid.to_hex()).is_file());
        assert_eq!(ledger.count(&repo).await.unwrap(), 1);

        assert!(ledger.remove(&repo, &oid).await.unwrap());
        assert_eq!(ledger.count(&repo).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_associate_creates_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FsAccessLedger::open(dir.path()).await.unwrap();
        let repo = RepoId::new("bob/media.git").unwrap();
        let oid = Oid::from_bytes(b"race");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                let repo = repo.clone();
                tokio::spawn(async move { ledger.associate(&repo, &oid).await.unwrap() })
            })
            .collect();
        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(ledger.count(&repo).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn count_for_unknown_repo_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FsAccessLedger::open(dir.path()).await.unwrap();
        let repo = RepoId::new("nobody/none.git").unwrap();
        assert_eq!(ledger.count(&repo).await.unwrap(), 0);
    }
}
