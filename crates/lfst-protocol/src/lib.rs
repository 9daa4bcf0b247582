//! Backend contract for the git-lfs-transfer protocol.
//!
//! The pktline framing and command loop live in an external protocol engine.
//! For every command it reads, the engine calls one method of
//! [`TransferBackend`] and encodes the result (or the [`Status`] derived from
//! the error) back onto the wire. This crate defines that contract and the
//! values that cross it, plus the JSON shapes of the hosting service's
//! internal LFS HTTP API used by the proxying realization.

pub mod args;
pub mod backend;
pub mod cancel;
pub mod endpoint;
pub mod error;
pub mod item;
pub mod message;
pub mod session;
pub mod status;

pub use args::{keys, Args};
pub use backend::{DownloadedObject, LockBackend, TransferBackend};
pub use cancel::cancellable;
pub use endpoint::{headers, mime, BATCH_PATH};
pub use error::{ErrorKind, TransferError, TransferResult};
pub use item::BatchItem;
pub use lfst_store::ObjectReader;
pub use message::{BatchRequest, BatchResponse, Link, ObjectError, ObjectResponse, Reference};
pub use session::Session;
pub use status::Status;

/// git-lfs-transfer protocol version implemented here.
pub const VERSION: &str = "1";

/// Capabilities advertised to the client before the first command.
///
/// `locking` is deliberately absent: no backend implements the lock API.
pub const CAPABILITIES: &[&str] = &["version=1"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_advertise_version_only() {
        assert_eq!(CAPABILITIES, &[format!("version={VERSION}").as_str()]);
        assert!(!CAPABILITIES.iter().any(|c| c.starts_with("locking")));
    }
}
