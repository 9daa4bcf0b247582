//! Connections to the main HTTP server.
//!
//! One connection per request: dial TCP or the configured unix socket,
//! optionally announce it with a PROXY protocol v2 LOCAL header, then wrap it
//! in TLS when the target URL is `https`. The TLS client presents
//! `proxy.domain` via SNI and accepts any certificate, since the server is
//! the same host's own listener and usually carries a certificate for the
//! public name only.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hyper::Uri;
use lfst_protocol::{TransferError, TransferResult};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};
use tokio_rustls::TlsConnector;
use tracing::trace;

use crate::config::{InternalProtocol, ProxyConfig};

/// PROXY protocol v2 signature.
pub const PROXY_V2_SIGNATURE: [u8; 12] = *b"\r\n\r\n\0\r\nQUIT\n";

/// Complete v2 header for a LOCAL connection: version 2, command LOCAL,
/// family UNSPEC, no address block.
pub const LOCAL_HEADER: [u8; 16] = [
    b'\r', b'\n', b'\r', b'\n', 0x00, b'\r', b'\n', b'Q', b'U', b'I', b'T', b'\n', 0x20, 0x00,
    0x00, 0x00,
];

pub trait Connection: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Connection for T {}

pub type BoxedConnection = Box<dyn Connection>;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Dial {
    Unix(PathBuf),
    Tcp { host: String, port: u16 },
}

pub struct Transport {
    dial: Dial,
    proxy_protocol: bool,
    tls: Option<(TlsConnector, ServerName<'static>)>,
    connect_timeout: Duration,
}

impl Transport {
    /// Plan a connection for `uri` under `config`.
    pub fn for_uri(config: &ProxyConfig, uri: &Uri) -> TransferResult<Self> {
        let secure = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            other => {
                return Err(TransferError::Transport(format!(
                    "unsupported scheme {:?} in {uri}",
                    other.unwrap_or("")
                )))
            }
        };

        // IPv6 literals come bracketed; neither dialing nor SNI accepts that.
        let host = uri
            .host()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']'));

        let dial = match (&config.protocol, &config.http_addr) {
            (InternalProtocol::HttpUnix, Some(path)) => Dial::Unix(path.clone()),
            (InternalProtocol::HttpUnix, None) => {
                return Err(TransferError::Transport("http+unix without http_addr".into()))
            }
            _ => {
                let host = host.ok_or_else(|| TransferError::Transport(format!("no host in {uri}")))?;
                let port = uri.port_u16().unwrap_or(if secure { 443 } else { 80 });
                Dial::Tcp {
                    host: host.to_string(),
                    port,
                }
            }
        };

        let tls = if secure {
            let name = if config.domain.is_empty() {
                host.unwrap_or_default().to_string()
            } else {
                config.domain.clone()
            };
            let name = ServerName::try_from(name)
                .map_err(|e| TransferError::Transport(format!("invalid TLS server name: {e}")))?;
            Some((insecure_connector()?, name))
        } else {
            None
        };

        Ok(Self {
            dial,
            proxy_protocol: config.local_use_proxy_protocol,
            tls,
            connect_timeout: config.connect_timeout(),
        })
    }

    /// Dial, announce and (if needed) secure a fresh connection.
    pub async fn connect(&self) -> TransferResult<BoxedConnection> {
        let timeout = self.connect_timeout;
        tokio::time::timeout(timeout, self.establish())
            .await
            .map_err(|_| TransferError::Timeout(timeout))?
    }

    async fn establish(&self) -> TransferResult<BoxedConnection> {
        let mut conn: BoxedConnection = match &self.dial {
            Dial::Unix(path) => Box::new(UnixStream::connect(path).await.map_err(|e| {
                TransferError::Transport(format!("dial unix {}: {e}", path.display()))
            })?),
            Dial::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port))
                    .await
                    .map_err(|e| TransferError::Transport(format!("dial {host}:{port}: {e}")))?;
                stream.set_nodelay(true)?;
                Box::new(stream)
            }
        };
        trace!(dial = ?self.dial, "connected");

        if self.proxy_protocol {
            conn.write_all(&LOCAL_HEADER).await?;
        }

        if let Some((connector, name)) = &self.tls {
            let stream = connector
                .connect(name.clone(), conn)
                .await
                .map_err(|e| TransferError::Transport(format!("TLS handshake: {e}")))?;
            conn = Box::new(stream);
        }
        Ok(conn)
    }
}

fn insecure_connector() -> TransferResult<TlsConnector> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| TransferError::Transport(format!("TLS config: {e}")))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Skips chain and name validation; handshake signatures are still checked.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn local_header_layout() {
        assert_eq!(&LOCAL_HEADER[..12], &PROXY_V2_SIGNATURE);
        assert_eq!(LOCAL_HEADER[12], 0x20);
        assert_eq!(&LOCAL_HEADER[13..], &[0, 0, 0]);
    }

    #[test]
    fn tcp_default_ports() {
        let config = ProxyConfig::new("http://localhost:3000");
        let plain = Transport::for_uri(&config, &uri("http://localhost/x")).unwrap();
        assert_eq!(plain.dial, Dial::Tcp { host: "localhost".into(), port: 80 });
        assert!(plain.tls.is_none());

        let secure = Transport::for_uri(&config, &uri("https://[::1]/x")).unwrap();
        assert_eq!(secure.dial, Dial::Tcp { host: "::1".into(), port: 443 });
        let (_, name) = secure.tls.unwrap();
        assert_eq!(name, ServerName::try_from("::1").unwrap());
    }

    #[test]
    fn sni_uses_configured_domain() {
        let mut config = ProxyConfig::new("https://127.0.0.1:3000");
        config.domain = "git.example.com".into();
        let transport = Transport::for_uri(&config, &uri("https://127.0.0.1:3000/x")).unwrap();
        let (_, name) = transport.tls.unwrap();
        assert_eq!(name, ServerName::try_from("git.example.com").unwrap());
    }

    #[test]
    fn unix_socket_ignores_url_host() {
        let mut config = ProxyConfig::new("http://unix/");
        config.protocol = InternalProtocol::HttpUnix;
        config.http_addr = Some(PathBuf::from("/run/forge/http.sock"));
        let transport = Transport::for_uri(&config, &uri("http://unix/alice/repo.git")).unwrap();
        assert_eq!(transport.dial, Dial::Unix(PathBuf::from("/run/forge/http.sock")));
    }

    #[test]
    fn rejects_other_schemes() {
        let config = ProxyConfig::new("http://localhost:3000");
        assert!(Transport::for_uri(&config, &uri("ftp://localhost/x")).is_err());
        assert!(Transport::for_uri(&config, &uri("/relative")).is_err());
    }
}
