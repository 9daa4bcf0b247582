use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{TransferError, TransferResult};

/// Argument keys understood on the wire.
pub mod keys {
    /// Opaque handle (a URL for the proxy backend) naming one transfer action.
    pub const ID: &str = "id";
    /// Bearer credential for the `id` handle.
    pub const TOKEN: &str = "token";
    /// Expiry of the handle and its credential.
    pub const EXPIRES_AT: &str = "expires-at";
    /// Ref the batch is issued for.
    pub const REFNAME: &str = "refname";
    /// Requested transfer adapter.
    pub const TRANSFER: &str = "transfer";
}

/// Ordered string arguments attached to a command or a batch item.
///
/// The engine relays item arguments to the client verbatim and hands them
/// back on the follow-up `get-object`/`put-object`/`verify-object` command.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Args(BTreeMap<String, String>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The `id` handle, required by every follow-up object command of the
    /// proxying backend.
    pub fn require_id(&self) -> TransferResult<&str> {
        self.get(keys::ID)
            .ok_or_else(|| TransferError::MissingData("missing id arg".into()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
