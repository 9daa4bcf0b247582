use lfst_types::{Oid, Pointer};
use serde::{Deserialize, Serialize};

use crate::args::Args;

/// One object's transfer-readiness record in a batch.
///
/// `present` means the backend already holds the object: nothing to download
/// is missing, or nothing needs uploading. `args` carries the handle, token
/// and expiry the client needs for the actual transfer, when there is one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub pointer: Pointer,
    pub present: bool,
    pub args: Args,
}

impl BatchItem {
    pub fn new(pointer: Pointer) -> Self {
        Self {
            pointer,
            present: false,
            args: Args::new(),
        }
    }

    pub fn oid(&self) -> &Oid {
        &self.pointer.oid
    }

    pub fn size(&self) -> u64 {
        self.pointer.size
    }
}

impl From<Pointer> for BatchItem {
    fn from(pointer: Pointer) -> Self {
        Self::new(pointer)
    }
}
