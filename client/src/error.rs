use std::time::Duration;
use strum::{AsRefStr, Display};
use thiserror::Error;

/// Failure reported by a [`Transport`](crate::Transport) when no response was
/// received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
}

/// Failure that may go away if the same request is sent again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransientFailure {
    #[error("service unavailable (HTTP {status}){}", detail_suffix(.detail))]
    ServiceUnavailable { status: u16, detail: Option<String> },
    #[error("{0}")]
    Network(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl TransientFailure {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            TransientFailure::ServiceUnavailable { .. } => FetchErrorKind::ServiceUnavailable,
            TransientFailure::Network(_) => FetchErrorKind::NetworkError,
            TransientFailure::MalformedResponse(_) => FetchErrorKind::MalformedResponse,
            TransientFailure::Timeout(_) => FetchErrorKind::Timeout,
        }
    }
}

/// Final error of [`PatternClient::fetch_patterns`](crate::PatternClient::fetch_patterns).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("invalid parameters{}", detail_suffix(.detail))]
    InvalidParameters { detail: Option<String> },
    #[error("authentication required{}", detail_suffix(.detail))]
    AuthenticationRequired { detail: Option<String> },
    #[error("access denied{}", detail_suffix(.detail))]
    AccessDenied { detail: Option<String> },
    #[error("unexpected HTTP status {status}{}", detail_suffix(.detail))]
    UnexpectedStatus { status: u16, detail: Option<String> },
    /// Only produced under [`MalformedBodyPolicy::Fail`](crate::MalformedBodyPolicy::Fail).
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("max retries exceeded after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: TransientFailure },
}

/// Flat classification of a [`FetchError`] for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FetchErrorKind {
    InvalidParameters,
    AuthenticationRequired,
    AccessDenied,
    UnexpectedStatus,
    ServiceUnavailable,
    NetworkError,
    MalformedResponse,
    Timeout,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::InvalidParameters { .. } => FetchErrorKind::InvalidParameters,
            FetchError::AuthenticationRequired { .. } => FetchErrorKind::AuthenticationRequired,
            FetchError::AccessDenied { .. } => FetchErrorKind::AccessDenied,
            FetchError::UnexpectedStatus { .. } => FetchErrorKind::UnexpectedStatus,
            FetchError::MalformedResponse(_) => FetchErrorKind::MalformedResponse,
            FetchError::RetriesExhausted { last, .. } => last.kind(),
        }
    }

    /// True once the retry budget was spent on transient failures.
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, FetchError::RetriesExhausted { .. })
    }

    /// Number of requests issued before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            FetchError::RetriesExhausted { attempts, .. } => *attempts,
            _ => 1,
        }
    }

    /// Short message suitable for a status line.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::InvalidParameters { detail } => with_detail(
                "Invalid filter parameters. Adjust the filters and try again.",
                detail,
            ),
            FetchError::AuthenticationRequired { .. } => {
                "Authentication required. Check the API token.".to_string()
            }
            FetchError::AccessDenied { .. } => {
                "Access denied. This account cannot run pattern scans.".to_string()
            }
            FetchError::UnexpectedStatus { status, detail } => {
                with_detail(&format!("Scan request rejected (HTTP {status})."), detail)
            }
            FetchError::MalformedResponse(_) => {
                "The scan service returned an unreadable response.".to_string()
            }
            FetchError::RetriesExhausted { attempts, last } => {
                let reason = match last {
                    TransientFailure::ServiceUnavailable { status, .. } => {
                        format!("Scan service unavailable (HTTP {status})")
                    }
                    TransientFailure::Network(msg) => format!("Network error: {msg}"),
                    TransientFailure::MalformedResponse(_) => {
                        "Scan service kept returning unreadable responses".to_string()
                    }
                    TransientFailure::Timeout(after) => {
                        format!("Scan request timed out after {}s", after.as_secs())
                    }
                };
                format!("{reason}; gave up after {attempts} attempts.")
            }
        }
    }
}

/// Errors raised while loading or applying a [`ClientConfig`](crate::ClientConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {d}"),
        None => String::new(),
    }
}

fn with_detail(base: &str, detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!("{base} ({d})"),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_reports_last_kind() {
        let err = FetchError::RetriesExhausted {
            attempts: 4,
            last: TransientFailure::ServiceUnavailable {
                status: 503,
                detail: None,
            },
        };
        assert_eq!(err.kind(), FetchErrorKind::ServiceUnavailable);
        assert_eq!(err.attempts(), 4);
        assert!(err.is_retries_exhausted());
        assert_eq!(
            err.to_string(),
            "max retries exceeded after 4 attempts: service unavailable (HTTP 503)"
        );
        assert_eq!(
            err.user_message(),
            "Scan service unavailable (HTTP 503); gave up after 4 attempts."
        );
    }

    #[test]
    fn detail_is_carried_in_display() {
        let err = FetchError::InvalidParameters {
            detail: Some("limit must be <= 500".into()),
        };
        assert_eq!(err.to_string(), "invalid parameters: limit must be <= 500");
        assert!(err.user_message().contains("limit must be <= 500"));
        assert!(!err.is_retries_exhausted());
    }

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(FetchErrorKind::AuthenticationRequired.to_string(), "authentication_required");
        assert_eq!(FetchErrorKind::Timeout.as_ref(), "timeout");
    }
}
