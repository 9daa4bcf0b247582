//! Foundation types for the LFS transfer backend.
//!
//! Every other `lfst` crate depends on `lfst-types`.
//!
//! # Key Types
//!
//! - [`Oid`] -- Content-addressed identifier (hex-encoded SHA-256)
//! - [`Pointer`] -- An object's identity plus its exact byte length
//! - [`RepoId`] -- Repository identity (`owner/name.git`) that scopes access
//! - [`Operation`] -- The transfer direction of a session (`download`/`upload`)
//! - [`IntegrityError`] -- Size or hash mismatch between declared and received bytes

pub mod error;
pub mod identity;
pub mod object;
pub mod operation;

pub use error::{IntegrityError, TypeError};
pub use identity::RepoId;
pub use object::{Oid, Pointer};
pub use operation::Operation;
