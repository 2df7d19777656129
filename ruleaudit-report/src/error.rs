use thiserror::Error;

/// Failures of the external report generator. None of them reach callers of
/// the renderer; they select the deterministic fallback instead.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("report generator credentials are not configured")]
    MissingCredentials,
    #[error("invalid generator url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("generator HTTP request failed: {0}")]
    Http(String),
    #[error("generator returned unexpected status {status}")]
    UnexpectedStatus { status: reqwest::StatusCode },
    #[error("failed to decode generator response: {0}")]
    Decode(String),
    #[error("generator did not answer within {0:?}")]
    Timeout(std::time::Duration),
}
