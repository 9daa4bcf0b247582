use std::time::Duration;

use lfst_ledger::LedgerError;
use lfst_store::StoreError;
use lfst_types::IntegrityError;
use thiserror::Error;

use crate::status::Status;

/// Errors a backend operation can fail with.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("unauthorized")]
    Unauthorized,

    #[error("conflict")]
    Conflict,

    #[error("parse error: {0}")]
    ParseError(String),

    /// A required argument or stream was not supplied.
    #[error("missing data: {0}")]
    MissingData(String),

    #[error("corrupt data: {0}")]
    CorruptData(#[from] IntegrityError),

    /// Remote status with no protocol-level meaning.
    #[error("server returned status {code}: {text}")]
    RemoteStatus { code: u16, text: String },

    /// A classified failure together with the remote status that caused it.
    #[error("{source} (remote status {} {})", .status.code, .status.messages.join(" "))]
    Rejected {
        status: Status,
        #[source]
        source: Box<TransferError>,
    },

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("internal request timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for backend operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Protocol-level classification of a [`TransferError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Unauthorized,
    Conflict,
    ParseError,
    MissingData,
    CorruptData,
    Internal,
}

impl ErrorKind {
    /// Wire status code the engine reports for this kind.
    pub fn status_code(&self) -> u32 {
        match self {
            Self::NotFound => 404,
            Self::Forbidden => 403,
            Self::Unauthorized => 401,
            Self::Conflict => 409,
            Self::ParseError | Self::MissingData | Self::CorruptData => 400,
            Self::Internal => 500,
        }
    }
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Conflict => ErrorKind::Conflict,
            Self::ParseError(_) => ErrorKind::ParseError,
            Self::MissingData(_) => ErrorKind::MissingData,
            Self::CorruptData(_) => ErrorKind::CorruptData,
            Self::Rejected { source, .. } => source.kind(),
            Self::RemoteStatus { .. }
            | Self::Store(_)
            | Self::Ledger(_)
            | Self::Transport(_)
            | Self::Timeout(_)
            | Self::Cancelled
            | Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// Status the engine writes back for this error.
    pub fn status(&self) -> Status {
        match self {
            Self::Rejected { status, .. } => status.clone(),
            Self::RemoteStatus { code, text } => Status::new(u32::from(*code), text.clone()),
            other => Status::new(other.kind().status_code(), other.to_string()),
        }
    }

    /// Attach the remote status that produced this error.
    pub fn with_status(self, status: Status) -> Self {
        Self::Rejected {
            status,
            source: Box::new(self),
        }
    }
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => Self::NotFound,
            StoreError::Integrity(e) => Self::CorruptData(e),
            other => Self::Store(other),
        }
    }
}
