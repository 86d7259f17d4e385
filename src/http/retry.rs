//! Retry policy for downloads: transient failures are retried, definite
//! client errors are not.

use reqwest::StatusCode;

/// Maximum number of attempts for a download.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Errors that should not be retried.
#[derive(Debug)]
pub enum NonRetryableError {
    /// The download URL does not exist on the server (HTTP 404).
    NotFound(String),
    /// The server refused the request (HTTP 401/403).
    AccessDenied(String),
    /// The server is rate limiting us (HTTP 429).
    RateLimited(String),
    /// Other client errors that won't succeed on retry.
    ClientError(String),
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::NotFound(msg) => {
                write!(
                    f,
                    "Download URL not found: {}. The manifest's url/version may be out of date.",
                    msg
                )
            }
            NonRetryableError::AccessDenied(msg) => {
                write!(f, "Access denied by the download server: {}", msg)
            }
            NonRetryableError::RateLimited(msg) => {
                write!(f, "Rate limited by the download server: {}. Try again later.", msg)
            }
            NonRetryableError::ClientError(msg) => {
                write!(f, "Request error: {}", msg)
            }
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// Classifies an error as retryable or non-retryable.
/// Returns Ok(()) if the error is retryable, Err with a user-friendly message if not.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    if let Some(status) = error.status() {
        match status {
            StatusCode::NOT_FOUND => {
                return Err(NonRetryableError::NotFound(
                    "the server returned 404".to_string(),
                ));
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(NonRetryableError::AccessDenied(format!(
                    "the server returned {}",
                    status.as_u16()
                )));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(NonRetryableError::RateLimited(
                    "too many requests".to_string(),
                ));
            }
            // Other 4xx client errors are generally not retryable
            s if s.is_client_error() => {
                return Err(NonRetryableError::ClientError(format!(
                    "HTTP {} error",
                    s.as_u16()
                )));
            }
            // 5xx server errors are retryable
            _ => {}
        }
    }

    // Connection errors, timeouts, etc. are retryable
    Ok(())
}

/// Checks if an error from `error_for_status()` should be retried.
/// Returns the original error if retryable, or a user-friendly NonRetryableError if not.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_retryable_error_display() {
        let err = NonRetryableError::NotFound("the server returned 404".to_string());
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("manifest"));

        let err = NonRetryableError::AccessDenied("403".to_string());
        assert!(err.to_string().contains("Access denied"));

        let err = NonRetryableError::RateLimited("x".to_string());
        assert!(err.to_string().contains("Rate limited"));

        let err = NonRetryableError::ClientError("HTTP 400".to_string());
        assert!(err.to_string().contains("HTTP 400"));
    }
}
