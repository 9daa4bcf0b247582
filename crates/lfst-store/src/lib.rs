//! Content-addressed LFS object storage.
//!
//! Objects are stored once, keyed by the SHA-256 of their bytes, no matter how
//! many repositories reference them. Authorization is not this crate's
//! concern: a present object is not necessarily accessible to a given
//! repository (see `lfst-ledger`).
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsContentStore`] -- sharded directory tree with atomic, verified writes
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written.
//! 2. Verify-then-link: bytes are hashed and counted while they are written
//!    to a temporary location and only become visible under their oid once
//!    they match the declared pointer.
//! 3. Writing an object that is already present is a successful no-op, so
//!    concurrent uploads of the same content never conflict.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsContentStore;
pub use memory::InMemoryContentStore;
pub use traits::{ContentStore, ObjectReader};
