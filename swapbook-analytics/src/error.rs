use thiserror::Error;

/// All errors generated by the swapbook backend API client.
///
/// Transport and body-decode failures both surface as [`ApiError::Http`];
/// a response that arrived but carried a non-success status is
/// [`ApiError::Status`]. Callers are expected to log and swallow these at
/// the call site, falling back to an empty view state - nothing here is
/// fatal and there is no retry policy.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected http status: {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid api url: {0}")]
    Url(#[from] url::ParseError),
}
