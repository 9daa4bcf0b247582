//! Per-repository access ledger for LFS objects.
//!
//! The content store deduplicates objects globally; this ledger records which
//! repositories are authorized to use each one. An object is accessible to a
//! repository only when it is both present in the store *and* associated
//! with the repository here.
//!
//! Association records are created on the first authorized upload (or proven
//! possession) and never mutated. Creating the same association twice is a
//! no-op, so two sessions uploading the same object at once cannot conflict.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{LedgerError, LedgerResult};
pub use fs::FsAccessLedger;
pub use memory::InMemoryAccessLedger;
pub use traits::AccessLedger;
