use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use lfst_types::{IntegrityError, Pointer};
use tokio::io::{AsyncRead, ReadBuf};

use crate::hasher::ContentHasher;

/// `AsyncRead` adapter that hashes and counts every byte passing through.
pub struct HashingReader<R> {
    inner: R,
    hasher: ContentHasher,
}

impl<R> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: ContentHasher::new(),
        }
    }

    /// Bytes read so far.
    pub fn bytes_read(&self) -> u64 {
        self.hasher.len()
    }

    /// Consume the adapter and check what was read against `expected`.
    pub fn verify(self, expected: &Pointer) -> Result<(), IntegrityError> {
        self.hasher.verify(expected)
    }

    /// Consume the adapter, returning the pointer of what was read.
    pub fn finish(self) -> Pointer {
        self.hasher.finish()
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for HashingReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        ready!(Pin::new(&mut self.inner).poll_read(cx, buf))?;
        let this = &mut *self;
        this.hasher.update(&buf.filled()[before..]);
        Poll::Ready(Ok(()))
    }
}
