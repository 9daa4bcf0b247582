use lfst_types::{Operation, RepoId};
use tokio_util::sync::CancellationToken;

/// Everything a backend needs to know about the SSH command it serves.
///
/// Built once per command invocation and handed to the backend constructor;
/// nothing about a session lives in process-wide state.
#[derive(Clone)]
pub struct Session {
    pub repo: RepoId,
    pub operation: Operation,
    /// Authorization header value for the internal API.
    pub token: String,
    pub cancel: CancellationToken,
}

impl Session {
    pub fn new(repo: RepoId, operation: Operation, token: impl Into<String>) -> Self {
        Self {
            repo,
            operation,
            token: token.into(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("repo", &self.repo)
            .field("operation", &self.operation)
            .field("token", &"<redacted>")
            .finish()
    }
}
