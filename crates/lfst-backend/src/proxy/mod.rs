//! Backend that forwards every operation to the internal LFS HTTP API.
//!
//! Batch goes to `{local_url}/{repo}/info/lfs/objects/batch`; the handles the
//! server returns travel to the client as item args and come back as the
//! `id` (a URL) of follow-up download, upload and verify commands. The
//! session token is sent as `Authorization` on every request.

mod request;
mod status;
mod transport;

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use hyper::Method;
use lfst_crypto::HashingReader;
use lfst_protocol::{
    cancellable, headers, keys, mime, Args, BatchItem, BatchRequest, BatchResponse,
    DownloadedObject, Link, LockBackend, ObjectReader, ObjectResponse, Reference, Session, Status,
    TransferBackend, TransferError, TransferResult, BATCH_PATH,
};
use lfst_types::{Oid, Operation, Pointer};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ProxyConfig;

pub use request::{InternalRequest, InternalResponse};
pub use status::{status_text, status_to_error};
pub use transport::{LOCAL_HEADER, PROXY_V2_SIGNATURE};

/// Upper bound on the buffer reserved up front for an upload.
const MAX_PREALLOC: usize = 8 << 20;

pub struct HttpProxyBackend {
    config: Arc<ProxyConfig>,
    server: String,
    token: String,
    cancel: CancellationToken,
}

impl HttpProxyBackend {
    pub fn new(config: Arc<ProxyConfig>, session: &Session) -> Self {
        let server = format!(
            "{}/{}/info/lfs",
            config.local_url.trim_end_matches('/'),
            session.repo
        );
        Self {
            config,
            server,
            token: session.token.clone(),
            cancel: session.cancel.clone(),
        }
    }

    /// Base URL of the repository's LFS API.
    pub fn server(&self) -> &str {
        &self.server
    }

    fn request(&self, method: Method, url: impl Into<String>) -> InternalRequest<'_> {
        InternalRequest::new(&self.config, method, url).header(headers::AUTHORIZATION, &self.token)
    }

    fn annotate(operation: Operation, object: ObjectResponse) -> BatchItem {
        let mut item = BatchItem::new(object.pointer());
        match operation {
            Operation::Download => match object.action("download") {
                Some(link) => {
                    item.present = true;
                    set_handle(&mut item.args, link);
                }
                None => {
                    debug!(oid = %object.oid.short_hex(), error = ?object.error, "no download action");
                }
            },
            // An upload action means the server still needs the bytes.
            Operation::Upload => match object.action("upload") {
                Some(link) => set_handle(&mut item.args, link),
                None => item.present = true,
            },
        }
        item
    }
}

fn set_handle(args: &mut Args, link: &Link) {
    args.insert(keys::ID, &link.href);
    if let Some(token) = link.authorization() {
        args.insert(keys::TOKEN, token);
    }
    if let Some(expires_at) = link.expires_at {
        args.insert(keys::EXPIRES_AT, expires_at.to_rfc3339());
    }
}

fn rejected(code: u16) -> TransferError {
    status_to_error(code).with_status(Status::new(u32::from(code), status_text(code)))
}

#[async_trait]
impl TransferBackend for HttpProxyBackend {
    async fn batch(
        &self,
        operation: Operation,
        items: Vec<BatchItem>,
        args: &Args,
    ) -> TransferResult<Vec<BatchItem>> {
        let request = BatchRequest {
            operation,
            transfers: args.get(keys::TRANSFER).map(|t| vec![t.to_string()]).unwrap_or_default(),
            reference: args.get(keys::REFNAME).map(|name| Reference { name: name.to_string() }),
            objects: items.iter().map(|item| item.pointer).collect(),
        };
        let body = serde_json::to_vec(&request)
            .map_err(|e| TransferError::ParseError(format!("encode batch request: {e}")))?;

        let response = self
            .request(Method::POST, format!("{}{}", self.server, BATCH_PATH))
            .header(headers::ACCEPT, mime::GIT_LFS_JSON)
            .header(headers::CONTENT_TYPE, mime::GIT_LFS_JSON)
            .body(body)
            .send(&self.cancel)
            .await?;
        if !response.is_ok() {
            warn!(status = response.status.as_u16(), "batch request rejected");
            return Err(status_to_error(response.status.as_u16()));
        }

        let parsed: BatchResponse = serde_json::from_slice(&response.body)
            .map_err(|e| TransferError::ParseError(format!("invalid batch response: {e}")))?;
        Ok(parsed
            .objects
            .into_iter()
            .map(|object| Self::annotate(operation, object))
            .collect())
    }

    async fn download(&self, oid: &Oid, args: &Args) -> TransferResult<DownloadedObject> {
        let url = args.require_id()?;
        let response = self
            .request(Method::GET, url)
            .header(headers::ACCEPT, mime::OCTET_STREAM)
            .send(&self.cancel)
            .await?;
        if !response.is_ok() {
            debug!(oid = %oid.short_hex(), status = response.status.as_u16(), "download rejected");
            return Err(status_to_error(response.status.as_u16()));
        }
        let size = response.body.len() as u64;
        Ok(DownloadedObject {
            reader: Box::new(Cursor::new(response.body)),
            size,
        })
    }

    async fn upload(
        &self,
        oid: &Oid,
        size: u64,
        reader: Option<ObjectReader>,
        args: &Args,
    ) -> TransferResult<()> {
        let url = args.require_id()?;
        let reader = reader.ok_or_else(|| TransferError::MissingData("missing object data".into()))?;
        let pointer = Pointer::new(*oid, size);

        let capacity = usize::try_from(size).unwrap_or(MAX_PREALLOC).min(MAX_PREALLOC);
        let mut body = Vec::with_capacity(capacity);
        let mut hashing = HashingReader::new(reader.take(size.saturating_add(1)));
        cancellable(&self.cancel, async {
            hashing.read_to_end(&mut body).await?;
            Ok(())
        })
        .await?;
        // Size is checked before the digest, so a short or long body reports
        // a size mismatch.
        hashing.verify(&pointer)?;

        let response = self
            .request(Method::PUT, url)
            .header(headers::CONTENT_TYPE, mime::OCTET_STREAM)
            .header(headers::CONTENT_LENGTH, size.to_string())
            .body(body)
            .send(&self.cancel)
            .await?;
        if !response.is_ok() {
            warn!(oid = %oid.short_hex(), status = response.status.as_u16(), "upload rejected");
            return Err(status_to_error(response.status.as_u16()));
        }
        Ok(())
    }

    async fn verify(&self, oid: &Oid, size: u64, args: &Args) -> TransferResult<Status> {
        let url = args
            .require_id()
            .map_err(|e| e.with_status(Status::new(400, "missing argument: id")))?;
        let body = serde_json::to_vec(&Pointer::new(*oid, size))
            .map_err(|e| TransferError::ParseError(format!("encode verify request: {e}")))?;
        let response = self
            .request(Method::POST, url)
            .header(headers::ACCEPT, mime::GIT_LFS_JSON)
            .header(headers::CONTENT_TYPE, mime::GIT_LFS_JSON)
            .body(body)
            .send(&self.cancel)
            .await?;
        if !response.is_ok() {
            return Err(rejected(response.status.as_u16()));
        }
        Ok(Status::success())
    }

    fn lock_backend(&self, _args: &Args) -> LockBackend {
        LockBackend::Unsupported
    }
}
