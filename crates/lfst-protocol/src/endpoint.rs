/// Batch endpoint, relative to a repository's `info/lfs` base URL.
pub const BATCH_PATH: &str = "/objects/batch";

/// HTTP header names used against the internal API.
pub mod headers {
    pub const ACCEPT: &str = "Accept";
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_LENGTH: &str = "Content-Length";
}

/// Media types.
pub mod mime {
    pub const GIT_LFS_JSON: &str = "application/vnd.git-lfs+json";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}
