//! LFS transfer backends.
//!
//! Two realizations of [`TransferBackend`](lfst_protocol::TransferBackend):
//!
//! - [`ContentStoreBackend`] -- talks directly to the content-addressed store
//!   and the per-repository access ledger, hashing and checking access itself.
//! - [`HttpProxyBackend`] -- forwards every operation to the hosting service's
//!   internal LFS HTTP API over a dedicated transport (TLS with SNI but no
//!   certificate verification, optional unix socket, optional PROXY header).
//!
//! [`AnyBackend`] picks one of them once, from [`BackendConfig`].

pub mod any;
pub mod config;
pub mod direct;
pub mod proxy;

pub use any::AnyBackend;
pub use config::{BackendConfig, BackendKind, ConfigError, DirectConfig, InternalProtocol, ProxyConfig};
pub use direct::ContentStoreBackend;
pub use proxy::{status_to_error, HttpProxyBackend, InternalRequest, InternalResponse};
