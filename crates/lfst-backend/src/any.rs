use std::sync::Arc;

use async_trait::async_trait;
use lfst_ledger::FsAccessLedger;
use lfst_protocol::{
    Args, BatchItem, DownloadedObject, LockBackend, ObjectReader, Session, Status, TransferBackend,
    TransferResult,
};
use lfst_store::FsContentStore;
use lfst_types::{Oid, Operation};
use tracing::info;

use crate::config::{BackendConfig, BackendKind, ConfigError};
use crate::direct::ContentStoreBackend;
use crate::proxy::HttpProxyBackend;

/// The backend chosen by configuration for one session.
pub enum AnyBackend {
    Direct(ContentStoreBackend),
    Proxy(HttpProxyBackend),
}

impl AnyBackend {
    /// Build the configured backend for `session`.
    ///
    /// The direct backend opens (and creates, if needed) its store and ledger
    /// directories; the proxy backend does no I/O until the first command.
    pub async fn from_config(config: &BackendConfig, session: &Session) -> Result<Self, ConfigError> {
        config.validate()?;
        match config.backend {
            BackendKind::Proxy => {
                let proxy = config
                    .proxy
                    .clone()
                    .ok_or_else(|| ConfigError::Invalid("missing [proxy] section".into()))?;
                info!(local_url = %proxy.local_url, protocol = ?proxy.protocol, "using proxy backend");
                Ok(Self::Proxy(HttpProxyBackend::new(Arc::new(proxy), session)))
            }
            BackendKind::Direct => {
                let direct = config
                    .direct
                    .as_ref()
                    .ok_or_else(|| ConfigError::Invalid("missing [direct] section".into()))?;
                let store = FsContentStore::open(&direct.store_root)
                    .await
                    .map_err(|e| ConfigError::Invalid(format!("open content store: {e}")))?;
                let ledger = FsAccessLedger::open(&direct.ledger_root)
                    .await
                    .map_err(|e| ConfigError::Invalid(format!("open access ledger: {e}")))?;
                let backend = ContentStoreBackend::new(Arc::new(store), Arc::new(ledger), session);
                info!(repo = %backend.repo(), store = %direct.store_root.display(), "using direct backend");
                Ok(Self::Direct(backend))
            }
        }
    }

    fn inner(&self) -> &dyn TransferBackend {
        match self {
            Self::Direct(backend) => backend,
            Self::Proxy(backend) => backend,
        }
    }
}

#[async_trait]
impl TransferBackend for AnyBackend {
    async fn batch(
        &self,
        operation: Operation,
        items: Vec<BatchItem>,
        args: &Args,
    ) -> TransferResult<Vec<BatchItem>> {
        self.inner().batch(operation, items, args).await
    }

    async fn download(&self, oid: &Oid, args: &Args) -> TransferResult<DownloadedObject> {
        self.inner().download(oid, args).await
    }

    async fn upload(
        &self,
        oid: &Oid,
        size: u64,
        reader: Option<ObjectReader>,
        args: &Args,
    ) -> TransferResult<()> {
        self.inner().upload(oid, size, reader, args).await
    }

    async fn verify(&self, oid: &Oid, size: u64, args: &Args) -> TransferResult<Status> {
        self.inner().verify(oid, size, args).await
    }

    fn lock_backend(&self, args: &Args) -> LockBackend {
        self.inner().lock_backend(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DirectConfig, ProxyConfig};
    use lfst_types::{Pointer, RepoId};
    use std::io::Cursor;
    use tokio::io::AsyncReadExt;

    fn session() -> Session {
        Session::new(RepoId::new("alice/repo.git").unwrap(), Operation::Upload, "Bearer t")
    }

    #[tokio::test]
    async fn direct_from_config_round_trips_object() {
        let dir = tempfile::tempdir().unwrap();
        let config = BackendConfig::direct(DirectConfig {
            store_root: dir.path().join("objects"),
            ledger_root: dir.path().join("access"),
        });
        let backend = AnyBackend::from_config(&config, &session()).await.unwrap();
        assert!(matches!(backend, AnyBackend::Direct(_)));

        let data = b"through the enum";
        let pointer = Pointer::for_content(data);
        let reader: ObjectReader = Box::new(Cursor::new(data.to_vec()));
        backend.upload(&pointer.oid, pointer.size, Some(reader), &Args::new()).await.unwrap();

        let items = backend
            .batch(Operation::Download, vec![BatchItem::new(pointer)], &Args::new())
            .await
            .unwrap();
        assert!(items[0].present);

        let mut object = backend.download(&pointer.oid, &Args::new()).await.unwrap();
        let mut out = Vec::new();
        object.reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, data);
        assert_eq!(backend.lock_backend(&Args::new()), LockBackend::Unsupported);
    }

    #[tokio::test]
    async fn proxy_from_config() {
        let config = BackendConfig::proxy(ProxyConfig::new("http://localhost:3000/"));
        match AnyBackend::from_config(&config, &session()).await.unwrap() {
            AnyBackend::Proxy(backend) => {
                assert_eq!(backend.server(), "http://localhost:3000/alice/repo.git/info/lfs")
            }
            AnyBackend::Direct(_) => panic!("expected proxy backend"),
        }
    }

    #[tokio::test]
    async fn invalid_config_rejected() {
        let config = BackendConfig::proxy(ProxyConfig::new(""));
        assert!(AnyBackend::from_config(&config, &session()).await.is_err());
    }
}
