use thiserror::Error;

/// Failure while downloading a single filter list.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server answered with HTTP {0}")]
    Status(u16),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl FetchError {
    /// Transient failures are worth another attempt; anything else aborts the
    /// retry loop for that source.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Status(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return FetchError::Status(status.as_u16());
        }
        if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
            return FetchError::Transport(e.to_string());
        }
        FetchError::Unexpected(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Transport("reset".into()).is_transient());
        assert!(FetchError::Status(503).is_transient());
        assert!(!FetchError::Unexpected("decode".into()).is_transient());
    }
}
