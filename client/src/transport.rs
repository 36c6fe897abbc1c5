use crate::error::{ConfigError, TransportError};
use async_trait::async_trait;
use reqwest::Url;

const USER_AGENT: &str = concat!("patternscan/", env!("CARGO_PKG_VERSION"));

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues a single GET. Implementations must not retry or time out on their
/// own; [`PatternClient`](crate::PatternClient) owns both.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    api_token: Option<String>,
}

impl HttpTransport {
    pub fn new(api_token: Option<String>) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(http, api_token))
    }

    pub fn with_client(http: reqwest::Client, api_token: Option<String>) -> Self {
        Self {
            http,
            api_token: api_token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        let mut request = self
            .http
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(format!("reading body: {e}")))?;
        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        (**self).get(url).await
    }
}
