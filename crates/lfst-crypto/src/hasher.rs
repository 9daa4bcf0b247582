use lfst_types::{IntegrityError, Oid, Pointer};
use sha2::{Digest, Sha256};

/// Incremental SHA-256 hasher that also counts bytes.
#[derive(Clone, Default)]
pub struct ContentHasher {
    digest: Sha256,
    len: u64,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
        self.len += data.len() as u64;
    }

    /// Bytes fed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The pointer describing everything fed so far.
    pub fn finish(self) -> Pointer {
        Pointer {
            oid: Oid::from_hash(self.digest.finalize().into()),
            size: self.len,
        }
    }

    /// Check the accumulated bytes against a declared pointer.
    ///
    /// Size is compared first: a short or long stream is reported as a size
    /// mismatch even though its digest necessarily differs too.
    pub fn verify(self, expected: &Pointer) -> Result<(), IntegrityError> {
        let actual = self.finish();
        if actual.size != expected.size {
            return Err(IntegrityError::SizeMismatch {
                expected: expected.size,
                actual: actual.size,
            });
        }
        if actual.oid != expected.oid {
            return Err(IntegrityError::HashMismatch {
                expected: expected.oid,
                actual: actual.oid,
            });
        }
        Ok(())
    }

    /// One-shot digest of `data`.
    pub fn hash(data: &[u8]) -> Oid {
        Oid::from_bytes(data)
    }
}

impl std::fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHasher").field("len", &self.len).finish()
    }
}
