use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::HOST;
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use lfst_protocol::{cancellable, TransferError, TransferResult};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::transport::Transport;
use crate::config::ProxyConfig;

/// A fully buffered response of the internal API.
#[derive(Clone, Debug)]
pub struct InternalResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl InternalResponse {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// One request to the main HTTP server over the configured transport.
///
/// Each request gets its own connection, released before `send` returns,
/// whether it completes, fails, times out or is cancelled.
pub struct InternalRequest<'a> {
    config: &'a ProxyConfig,
    method: Method,
    url: String,
    headers: Vec<(&'static str, String)>,
    body: Bytes,
}

impl<'a> InternalRequest<'a> {
    pub fn new(config: &'a ProxyConfig, method: Method, url: impl Into<String>) -> Self {
        Self {
            config,
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Send under the request timeout, aborting early if `cancel` fires.
    pub async fn send(self, cancel: &CancellationToken) -> TransferResult<InternalResponse> {
        let timeout = self.config.request_timeout();
        cancellable(cancel, async move {
            tokio::time::timeout(timeout, self.execute())
                .await
                .map_err(|_| TransferError::Timeout(timeout))?
        })
        .await
    }

    async fn execute(self) -> TransferResult<InternalResponse> {
        let uri: Uri = self
            .url
            .parse()
            .map_err(|e| TransferError::Transport(format!("invalid url {}: {e}", self.url)))?;
        let authority = uri
            .authority()
            .ok_or_else(|| TransferError::Transport(format!("no host in {uri}")))?
            .to_string();
        let target = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let conn = Transport::for_uri(self.config, &uri)?.connect().await?;
        let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(conn))
            .await
            .map_err(transport_error)?;
        let _driver = AbortOnDrop(tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!(error = %e, "internal connection closed with error");
            }
        }));

        let mut builder = Request::builder()
            .method(self.method.clone())
            .uri(target)
            .header(HOST, authority);
        for (name, value) in &self.headers {
            builder = builder.header(*name, value.as_str());
        }
        let request = builder
            .body(Full::new(self.body))
            .map_err(|e| TransferError::Transport(format!("invalid request: {e}")))?;

        let response = sender.send_request(request).await.map_err(transport_error)?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(transport_error)?
            .to_bytes();
        debug!(method = %self.method, url = %self.url, status = status.as_u16(), len = body.len(), "internal request");
        Ok(InternalResponse { status, body })
    }
}

fn transport_error(e: hyper::Error) -> TransferError {
    TransferError::Transport(e.to_string())
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
