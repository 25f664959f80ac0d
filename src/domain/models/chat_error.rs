use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Sign in to continue")]
    AuthenticationRequired,

    #[error("Daily limit of {0} messages reached")]
    DailyLimitReached(u32),

    #[error("Rate limited by the local request window")]
    RateLimited,

    #[error("Upstream quota exceeded")]
    UpstreamQuotaExceeded,

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream request failed with status {0}")]
    UpstreamStatus(u16),

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),
}

impl ChatError {
    /// Failures worth another attempt with backoff.
    pub fn is_transient(&self) -> bool {
        return matches!(self, ChatError::Timeout | ChatError::Network(_));
    }
}
