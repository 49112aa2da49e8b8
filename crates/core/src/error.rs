pub use reqwest::StatusCode;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    GrantsGov,
    Completion,
}

/// A non-success HTTP status returned by one of the upstream services.
///
/// Carried inside `anyhow::Error`; callers that need the status downcast to it.
#[derive(Debug, Clone)]
pub struct UpstreamError {
    pub upstream: Upstream,
    pub status: StatusCode,
    pub body: String,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "upstream error (upstream={:?}, status={}): {}",
            self.upstream, self.status, self.body
        )
    }
}

impl std::error::Error for UpstreamError {}

/// Finds an [`UpstreamError`] anywhere in the error's cause chain.
pub fn find_upstream_error(err: &anyhow::Error) -> Option<&UpstreamError> {
    err.chain().find_map(|cause| cause.downcast_ref::<UpstreamError>())
}
