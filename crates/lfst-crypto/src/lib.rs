//! Content hashing for the LFS transfer backend.
//!
//! LFS object ids are plain SHA-256 digests of the object bytes, so unlike a
//! typed object store there is no domain separation here: the digest of the
//! bytes *is* the identity.
//!
//! [`HashingReader`] wraps any `AsyncRead` and accumulates the digest and the
//! byte count of everything read through it, which lets callers verify a
//! stream against a declared [`Pointer`](lfst_types::Pointer) while copying it
//! elsewhere (or nowhere).

pub mod hasher;
pub mod reader;

pub use hasher::ContentHasher;
pub use reader::HashingReader;
