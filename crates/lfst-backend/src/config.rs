//! Backend selection and transport settings, loaded from TOML.
//!
//! ```toml
//! backend = "proxy"
//!
//! [proxy]
//! local_url = "http://localhost:3000/"
//! domain = "git.example.com"
//! protocol = "http+unix"
//! http_addr = "/run/forge/http.sock"
//! local_use_proxy_protocol = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which backend realization serves the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Direct,
    Proxy,
}

/// How the main HTTP server is reached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InternalProtocol {
    #[default]
    #[serde(rename = "http")]
    Http,
    /// TLS to `local_url`, which must then be `https://`.
    #[serde(rename = "https")]
    Https,
    /// Plain HTTP over the unix socket at `http_addr`.
    #[serde(rename = "http+unix")]
    HttpUnix,
}

/// Settings of the proxying backend's internal transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Base URL of the main HTTP server as seen from this host.
    pub local_url: String,
    /// Server name sent via SNI when `local_url` is `https`.
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub protocol: InternalProtocol,
    /// Unix socket path, required for `http+unix`.
    #[serde(default)]
    pub http_addr: Option<PathBuf>,
    /// Send a PROXY protocol v2 LOCAL header on every new connection.
    #[serde(default)]
    pub local_use_proxy_protocol: bool,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl ProxyConfig {
    pub fn new(local_url: impl Into<String>) -> Self {
        Self {
            local_url: local_url.into(),
            domain: String::new(),
            protocol: InternalProtocol::Http,
            http_addr: None,
            local_use_proxy_protocol: false,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.local_url.trim().is_empty() {
            return Err(ConfigError::Invalid("proxy.local_url must not be empty".into()));
        }
        if self.protocol == InternalProtocol::HttpUnix && self.http_addr.is_none() {
            return Err(ConfigError::Invalid(
                "proxy.http_addr is required for protocol http+unix".into(),
            ));
        }
        let secure_url = self.local_url.trim().starts_with("https://");
        match self.protocol {
            InternalProtocol::Https if !secure_url => {
                return Err(ConfigError::Invalid(
                    "proxy.protocol https needs an https:// local_url".into(),
                ))
            }
            InternalProtocol::Http if secure_url => {
                return Err(ConfigError::Invalid(
                    "proxy.protocol http needs an http:// local_url".into(),
                ))
            }
            _ => {}
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("proxy timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

/// Locations of the direct backend's content store and access ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectConfig {
    pub store_root: PathBuf,
    pub ledger_root: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub backend: BackendKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct: Option<DirectConfig>,
}

impl BackendConfig {
    pub fn proxy(config: ProxyConfig) -> Self {
        Self {
            backend: BackendKind::Proxy,
            proxy: Some(config),
            direct: None,
        }
    }

    pub fn direct(config: DirectConfig) -> Self {
        Self {
            backend: BackendKind::Direct,
            proxy: None,
            direct: Some(config),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// The section matching `backend` must be present and well-formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            BackendKind::Proxy => self
                .proxy
                .as_ref()
                .ok_or_else(|| ConfigError::Invalid("backend = \"proxy\" needs a [proxy] section".into()))?
                .validate(),
            BackendKind::Direct => {
                self.direct
                    .as_ref()
                    .ok_or_else(|| ConfigError::Invalid("backend = \"direct\" needs a [direct] section".into()))?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_proxy_with_defaults() {
        let config = BackendConfig::from_toml(
            r#"
            backend = "proxy"

            [proxy]
            local_url = "http://localhost:3000/"
            domain = "git.example.com"
            "#,
        )
        .unwrap();
        let proxy = config.proxy.unwrap();
        assert_eq!(proxy.protocol, InternalProtocol::Http);
        assert!(!proxy.local_use_proxy_protocol);
        assert_eq!(proxy.connect_timeout(), Duration::from_secs(10));
        assert_eq!(proxy.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn parse_unix_socket() {
        let config = BackendConfig::from_toml(
            r#"
            backend = "proxy"

            [proxy]
            local_url = "http://unix/"
            protocol = "http+unix"
            http_addr = "/run/forge/http.sock"
            local_use_proxy_protocol = true
            "#,
        )
        .unwrap();
        let proxy = config.proxy.unwrap();
        assert_eq!(proxy.protocol, InternalProtocol::HttpUnix);
        assert_eq!(proxy.http_addr.as_deref(), Some(Path::new("/run/forge/http.sock")));
        assert!(proxy.local_use_proxy_protocol);
    }

    #[test]
    fn unix_socket_requires_path() {
        let err = BackendConfig::from_toml(
            r#"
            backend = "proxy"
            [proxy]
            local_url = "http://unix/"
            protocol = "http+unix"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("http_addr"));
    }

    #[test]
    fn missing_section_rejected() {
        let err = BackendConfig::from_toml("backend = \"direct\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_backend_rejected() {
        let err = BackendConfig::from_toml("backend = \"s3\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn protocol_must_match_url_scheme() {
        let mut proxy = ProxyConfig::new("https://localhost:3000/");
        proxy.protocol = InternalProtocol::Https;
        proxy.domain = "git.example.com".into();
        assert!(proxy.validate().is_ok());

        proxy.protocol = InternalProtocol::Http;
        let err = proxy.validate().unwrap_err();
        assert!(err.to_string().contains("http:// local_url"));

        let mut proxy = ProxyConfig::new("http://localhost:3000/");
        proxy.protocol = InternalProtocol::Https;
        let err = proxy.validate().unwrap_err();
        assert!(err.to_string().contains("https:// local_url"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut proxy = ProxyConfig::new("http://localhost:3000");
        proxy.request_timeout_secs = 0;
        assert!(BackendConfig::proxy(proxy).validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lfs.toml");
        std::fs::write(
            &path,
            "backend = \"direct\"\n[direct]\nstore_root = \"/srv/lfs\"\nledger_root = \"/srv/lfs-meta\"\n",
        )
        .unwrap();
        let config = BackendConfig::load(&path).unwrap();
        assert_eq!(config.backend, BackendKind::Direct);
        assert_eq!(config.direct.unwrap().store_root, PathBuf::from("/srv/lfs"));

        let missing = BackendConfig::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}
