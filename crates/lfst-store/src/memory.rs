use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use lfst_crypto::ContentHasher;
use lfst_types::{IntegrityError, Oid, Pointer};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{StoreError, StoreResult};
use crate::traits::{ContentStore, ObjectReader};

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. Object bytes are shared behind `Arc`, so
/// readers handed out by [`get`](ContentStore::get) stay valid even if the
/// object is deleted while they are being read.
pub struct InMemoryContentStore {
    objects: RwLock<HashMap<Oid, Arc<[u8]>>>,
}

impl InMemoryContentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Insert bytes directly, bypassing the upload path.
    ///
    /// Used to seed objects that arrived through another repository.
    pub fn insert(&self, data: &[u8]) -> Pointer {
        let pointer = Pointer::for_content(data);
        self.objects
            .write()
            .expect("lock poisoned")
            .entry(pointer.oid)
            .or_insert_with(|| Arc::from(data));
        pointer
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn exists(&self, oid: &Oid) -> StoreResult<bool> {
        Ok(self.objects.read().expect("lock poisoned").contains_key(oid))
    }

    async fn meta(&self, oid: &Oid) -> StoreResult<Option<Pointer>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(oid).map(|data| Pointer::new(*oid, data.len() as u64)))
    }

    async fn get(&self, pointer: &Pointer) -> StoreResult<ObjectReader> {
        let data = self
            .objects
            .read()
            .expect("lock poisoned")
            .get(&pointer.oid)
            .cloned()
            .ok_or(StoreError::NotFound(pointer.oid))?;
        if data.len() as u64 != pointer.size {
            return Err(IntegrityError::SizeMismatch {
                expected: pointer.size,
                actual: data.len() as u64,
            }
            .into());
        }
        Ok(Box::new(Cursor::new(data)))
    }

    async fn put(
        &self,
        pointer: &Pointer,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StoreResult<()> {
        let mut data = Vec::new();
        reader
            .take(pointer.size.saturating_add(1))
            .read_to_end(&mut data)
            .await?;

        let mut hasher = ContentHasher::new();
        hasher.update(&data);
        hasher.verify(pointer)?;

        // Idempotent: identical oid means identical bytes.
        self.objects
            .write()
            .expect("lock poisoned")
            .entry(pointer.oid)
            .or_insert_with(|| Arc::from(data));
        Ok(())
    }

    async fn delete(&self, oid: &Oid) -> StoreResult<bool> {
        Ok(self.objects.write().expect("lock poisoned").remove(oid).is_some())
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn put_bytes(store: &InMemoryContentStore, pointer: &Pointer, data: &[u8]) -> StoreResult<()> {
        let mut reader = data;
        store.put(pointer, &mut reader).await
    }

    async fn read_all(mut reader: ObjectReader) -> Vec<u8> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn put_and_get() {
        let store = InMemoryContentStore::new();
        let pointer = Pointer::for_content(b"hello world");
        put_bytes(&store, &pointer, b"hello world").await.unwrap();

        assert!(store.exists(&pointer.oid).await.unwrap());
        assert_eq!(store.meta(&pointer.oid).await.unwrap(), Some(pointer));
        let reader = store.get(&pointer).await.unwrap();
        assert_eq!(read_all(reader).await, b"hello world");
    }

    #[tokio::test]
    async fn put_is_idempotent() {
        let store = InMemoryContentStore::new();
        let pointer = Pointer::for_content(b"same");
        put_bytes(&store, &pointer, b"same").await.unwrap();
        put_bytes(&store, &pointer, b"same").await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_bytes(), 4);
    }

    #[tokio::test]
    async fn short_stream_is_rejected() {
        let store = InMemoryContentStore::new();
        let pointer = Pointer::new(Oid::from_bytes(b"0123456789"), 10);
        let err = put_bytes(&store, &pointer, b"01234567").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Integrity(IntegrityError::SizeMismatch { expected: 10, actual: 8 })
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn long_stream_is_rejected_without_draining() {
        let store = InMemoryContentStore::new();
        let pointer = Pointer::for_content(b"abc");
        let err = put_bytes(&store, &pointer, b"abcdefgh").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Integrity(IntegrityError::SizeMismatch { expected: 3, actual: 4 })
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn wrong_digest_is_rejected() {
        let store = InMemoryContentStore::new();
        let pointer = Pointer::new(Oid::from_bytes(b"original"), 8);
        let err = put_bytes(&store, &pointer, b"tampered").await.unwrap_err();
        assert!(matches!(err, StoreError::Integrity(IntegrityError::HashMismatch { .. })));
        assert!(!store.exists(&pointer.oid).await.unwrap());
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = InMemoryContentStore::new();
        let pointer = Pointer::for_content(b"missing");
        assert!(matches!(store.get(&pointer).await, Err(StoreError::NotFound(_))));
        assert_eq!(store.meta(&pointer.oid).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_object() {
        let store = InMemoryContentStore::new();
        let pointer = store.insert(b"to-delete");
        assert!(store.delete(&pointer.oid).await.unwrap());
        assert!(!store.exists(&pointer.oid).await.unwrap());
        assert!(!store.delete(&pointer.oid).await.unwrap());
    }

    #[tokio::test]
    async fn reader_survives_delete() {
        let store = InMemoryContentStore::new();
        let pointer = store.insert(b"still readable");
        let reader = store.get(&pointer).await.unwrap();
        store.delete(&pointer.oid).await.unwrap();
        assert_eq!(read_all(reader).await, b"still readable");
    }

    #[test]
    fn debug_format() {
        let store = InMemoryContentStore::new();
        store.insert(b"x");
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryContentStore"));
        assert!(debug.contains("object_count"));
    }
}
