use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lfst_crypto::HashingReader;
use lfst_types::{IntegrityError, Oid, Pointer};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{ContentStore, ObjectReader};

const TMP_DIR: &str = "tmp";

/// Filesystem content store.
///
/// Objects live at `<root>/<oid[0..2]>/<oid[2..4]>/<oid[4..]>`. Uploads are
/// streamed into `<root>/tmp` and renamed into place only after the byte
/// count and digest match, so a reader never observes a partial object.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(TMP_DIR)).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, oid: &Oid) -> PathBuf {
        let hex = oid.to_hex();
        self.root.join(&hex[0..2]).join(&hex[2..4]).join(&hex[4..])
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn exists(&self, oid: &Oid) -> StoreResult<bool> {
        Ok(tokio::fs::try_exists(self.object_path(oid)).await?)
    }

    async fn meta(&self, oid: &Oid) -> StoreResult<Option<Pointer>> {
        match tokio::fs::metadata(self.object_path(oid)).await {
            Ok(meta) => Ok(Some(Pointer::new(*oid, meta.len()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, pointer: &Pointer) -> StoreResult<ObjectReader> {
        let file = match tokio::fs::File::open(self.object_path(&pointer.oid)).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(pointer.oid))
            }
            Err(e) => return Err(e.into()),
        };
        let actual = file.metadata().await?.len();
        if actual != pointer.size {
            return Err(IntegrityError::SizeMismatch {
                expected: pointer.size,
                actual,
            }
            .into());
        }
        Ok(Box::new(file))
    }

    async fn put(
        &self,
        pointer: &Pointer,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StoreResult<()> {
        let (file, temp_path) = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(self.root.join(TMP_DIR))?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut hashing = HashingReader::new(reader.take(pointer.size.saturating_add(1)));
        tokio::io::copy(&mut hashing, &mut file).await?;
        file.flush().await?;
        // `temp_path` removes the file on every early return below.
        hashing.verify(pointer)?;
        file.sync_all().await?;
        drop(file);

        let dest = self.object_path(&pointer.oid);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Renaming over an existing object is safe: same oid, same bytes.
        temp_path.persist(&dest).map_err(|e| e.error)?;
        debug!(oid = %pointer.oid, size = pointer.size, "stored object");
        Ok(())
    }

    async fn delete(&self, oid: &Oid) -> StoreResult<bool> {
        match tokio::fs::remove_file(self.object_path(oid)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
