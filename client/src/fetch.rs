use crate::config::ClientConfig;
use crate::error::{ConfigError, FetchError, TransientFailure, TransportError};
use crate::query::PatternFilters;
use crate::retry::{MalformedBodyPolicy, RetryPolicy};
use crate::telemetry;
use crate::transport::{HttpTransport, RawResponse, Transport};
use crate::types::{PatternRecord, PatternsResponse};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a single attempt after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Success(Vec<PatternRecord>),
    Transient(TransientFailure),
    Terminal(FetchError),
}

/// Fetches pattern lists from one scan endpoint.
///
/// Attempts run strictly one after another. Each is bounded by the
/// configured timeout; transient failures are retried per [`RetryPolicy`].
pub struct PatternClient<T: Transport = HttpTransport> {
    transport: Arc<T>,
    endpoint: Url,
    timeout: Duration,
    retry: RetryPolicy,
}

impl<T: Transport> Clone for PatternClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            endpoint: self.endpoint.clone(),
            timeout: self.timeout,
            retry: self.retry,
        }
    }
}

impl PatternClient<HttpTransport> {
    /// Client over `reqwest` built from `config`.
    pub fn http(config: &ClientConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(config.patterns.api_token.clone())?;
        Self::new(transport, config)
    }
}

impl<T: Transport> PatternClient<T> {
    pub fn new(transport: T, config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            transport: Arc::new(transport),
            endpoint: config.endpoint_url()?,
            timeout: config.timeout(),
            retry: config.retry,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the patterns matching `filters`.
    ///
    /// Terminal failures return on first sight. Transient ones are retried
    /// until `max_retries` is spent, after which
    /// [`FetchError::RetriesExhausted`] carries the last failure.
    pub async fn fetch_patterns(
        &self,
        filters: &PatternFilters,
    ) -> Result<Vec<PatternRecord>, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            let url = filters.to_url(&self.endpoint);
            telemetry::record_attempt();
            log::debug!("pattern fetch attempt {} -> {}", attempt + 1, url);

            let outcome = match tokio::time::timeout(self.timeout, self.transport.get(&url)).await {
                Ok(result) => classify(result, self.retry.malformed),
                Err(_) => Classified::Transient(TransientFailure::Timeout(self.timeout)),
            };

            match outcome {
                Classified::Success(patterns) => {
                    log::debug!(
                        "pattern fetch ok: {} records after {} attempt(s)",
                        patterns.len(),
                        attempt + 1
                    );
                    return Ok(patterns);
                }
                Classified::Terminal(err) => {
                    log::warn!("pattern fetch failed (terminal): {err}");
                    telemetry::record_failure(err.kind());
                    return Err(err);
                }
                Classified::Transient(failure) => {
                    if !self.retry.should_retry(attempt) {
                        let err = FetchError::RetriesExhausted {
                            attempts: attempt + 1,
                            last: failure,
                        };
                        log::warn!("pattern fetch giving up: {err}");
                        telemetry::record_failure(err.kind());
                        return Err(err);
                    }
                    let delay = self.retry.delay_for(attempt);
                    log::warn!(
                        "pattern fetch attempt {} failed: {failure}; retrying in {:?}",
                        attempt + 1,
                        delay
                    );
                    telemetry::record_retry(failure.kind());
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Maps one transport result onto success, transient or terminal.
pub fn classify(
    result: Result<RawResponse, TransportError>,
    malformed: MalformedBodyPolicy,
) -> Classified {
    let response = match result {
        Ok(response) => response,
        Err(TransportError::Network(msg)) => {
            return Classified::Transient(TransientFailure::Network(msg))
        }
    };

    if response.is_success() {
        return match serde_json::from_str::<PatternsResponse>(&response.body) {
            Ok(parsed) => Classified::Success(parsed.patterns),
            Err(e) => match malformed {
                MalformedBodyPolicy::Retry => {
                    Classified::Transient(TransientFailure::MalformedResponse(e.to_string()))
                }
                MalformedBodyPolicy::Fail => {
                    Classified::Terminal(FetchError::MalformedResponse(e.to_string()))
                }
            },
        };
    }

    let detail = error_detail(&response.body);
    match response.status {
        400 => Classified::Terminal(FetchError::InvalidParameters { detail }),
        401 => Classified::Terminal(FetchError::AuthenticationRequired { detail }),
        403 => Classified::Terminal(FetchError::AccessDenied { detail }),
        404 | 429 | 500 | 502 | 503 | 504 => {
            Classified::Transient(TransientFailure::ServiceUnavailable {
                status: response.status,
                detail,
            })
        }
        status @ 500..=599 => {
            Classified::Transient(TransientFailure::ServiceUnavailable { status, detail })
        }
        status => Classified::Terminal(FetchError::UnexpectedStatus { status, detail }),
    }
}

/// Human-readable detail from an optional JSON error body.
///
/// Looks at `detail`, then `error`, then `message`. Non-string values are
/// rendered as compact JSON.
pub fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let obj = value.as_object()?;
    ["detail", "error", "message"]
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null())
        .map(|v| match v.as_str() {
            Some(s) => s.to_string(),
            None => v.to_string(),
        })
}
