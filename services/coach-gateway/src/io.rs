//! HTTP transport abstraction for testability
//!
//! The gateway never talks to reqwest directly. It builds a `TransportRequest`
//! per call and hands it to a `Transport`, which makes exactly one network
//! attempt and reports raw status and body bytes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::TransportConfig;
use crate::endpoint::{Method, TimeoutProfile};
use crate::error::SetupError;

/// One outgoing request. Built fresh per call and never reused.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub profile: TimeoutProfile,
}

impl TransportRequest {
    pub fn get(url: impl Into<String>, profile: TimeoutProfile) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            body: None,
            profile,
        }
    }

    pub fn post_json(url: impl Into<String>, body: Vec<u8>, profile: TimeoutProfile) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
            profile,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw HTTP response from a request
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body as text for diagnostics; invalid UTF-8 is replaced
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Low-level failure before a status line was received
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Abstraction over the HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// Execute a request, making exactly one network attempt
    async fn execute(&self, request: TransportRequest) -> Result<RawResponse, TransportError>;
}

/// Production transport using a pooled reqwest client.
///
/// reqwest only bounds idle connections, so total and per-destination caps
/// are enforced with semaphore permits held for the life of each request.
pub struct ReqwestTransport {
    client: reqwest::Client,
    total: Arc<Semaphore>,
    per_host: Mutex<HashMap<String, Arc<Semaphore>>>,
    max_per_host: usize,
    probe_timeout: Duration,
    response_timeout: Duration,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("available", &self.total.available_permits())
            .field("max_per_host", &self.max_per_host)
            .field("probe_timeout", &self.probe_timeout)
            .field("response_timeout", &self.response_timeout)
            .finish()
    }
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, SetupError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .pool_idle_timeout(config.idle_timeout())
            .pool_max_idle_per_host(config.max_connections_per_host)
            .build()
            .map_err(|e| SetupError::Transport(e.to_string()))?;

        tracing::debug!(
            "Created transport (max {} connections, {} per host, idle {:?})",
            config.max_connections,
            config.max_connections_per_host,
            config.idle_timeout()
        );

        Ok(Self {
            client,
            total: Arc::new(Semaphore::new(config.max_connections)),
            per_host: Mutex::new(HashMap::new()),
            max_per_host: config.max_connections_per_host,
            probe_timeout: config.probe_timeout(),
            response_timeout: config.response_timeout(),
        })
    }

    /// Response deadline for a profile
    pub fn deadline(&self, profile: TimeoutProfile) -> Duration {
        match profile {
            TimeoutProfile::Probe => self.probe_timeout,
            TimeoutProfile::Compute => self.response_timeout,
        }
    }

    fn host_semaphore(&self, authority: &str) -> Arc<Semaphore> {
        let mut hosts = match self.per_host.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(
            hosts
                .entry(authority.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.max_per_host))),
        )
    }

    async fn acquire(
        &self,
        url: &reqwest::Url,
    ) -> Result<(OwnedSemaphorePermit, OwnedSemaphorePermit), TransportError> {
        let authority = format!(
            "{}:{}",
            url.host_str().unwrap_or_default(),
            url.port_or_known_default().unwrap_or_default()
        );
        let total = Arc::clone(&self.total)
            .acquire_owned()
            .await
            .map_err(|_| TransportError::Io("connection pool closed".to_string()))?;
        let host = self
            .host_semaphore(&authority)
            .acquire_owned()
            .await
            .map_err(|_| TransportError::Io("connection pool closed".to_string()))?;
        Ok((total, host))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| TransportError::Io(format!("invalid URL {}: {}", request.url, e)))?;
        let _permits = self.acquire(&url).await?;

        tracing::debug!("{} {}", request.method, url);
        let mut builder = match request.method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder = builder.timeout(self.deadline(request.profile));

        let response = builder
            .send()
            .await
            .map_err(|e| classify(&request.method, &request.url, e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify(&request.method, &request.url, e))?;

        tracing::debug!(
            "{} {} -> {} ({} bytes)",
            request.method,
            request.url,
            status,
            body.len()
        );
        Ok(RawResponse::new(status, body.to_vec()))
    }
}

/// Connect failures win over timeouts so a dead host reads as unreachable
fn classify(method: &Method, url: &str, e: reqwest::Error) -> TransportError {
    let detail = format!("{} {} failed: {}", method, url, e);
    if e.is_connect() {
        TransportError::Connect(detail)
    } else if e.is_timeout() {
        TransportError::Timeout(detail)
    } else {
        TransportError::Io(detail)
    }
}
