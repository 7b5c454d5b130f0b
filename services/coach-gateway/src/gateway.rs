//! Gateway: one method per remote operation
//!
//! Owns the transport and the reference cache. Each call checks the cache when
//! the endpoint allows it, builds a fresh request, executes it under the
//! endpoint's timeout profile and turns the raw status and body into either a
//! decoded value or a `GatewayError`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::ResponseCache;
use crate::document::Document;
use crate::endpoint::{
    Endpoint, Method, ASSESS, CHAT, HEALTH_PROBE, PARSE_REPORT, REFERENCE_LIST, UPLOAD_IMAGE,
};
use crate::error::{GatewayError, Result};
use crate::io::{RawResponse, Transport, TransportError, TransportRequest};
use crate::types::{
    Assessment, AssessmentRequest, ChatReply, ChatRequest, ImageUpload, ReferenceList,
    ReferenceResource, ReportRequest,
};

/// A remote operation with its parameters, as issued by the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    ReferenceList(ReferenceResource),
    Assess(AssessmentRequest),
    UploadImage(ImageUpload),
    ParseReport(ReportRequest),
    Chat(ChatRequest),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ReferenceList(_) => REFERENCE_LIST.name,
            Operation::Assess(_) => ASSESS.name,
            Operation::UploadImage(_) => UPLOAD_IMAGE.name,
            Operation::ParseReport(_) => PARSE_REPORT.name,
            Operation::Chat(_) => CHAT.name,
        }
    }
}

/// Successful result of an `Operation`
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    References(Arc<ReferenceList>),
    Assessment(Assessment),
    Document(Document),
    Chat(ChatReply),
}

pub struct Gateway {
    base_url: String,
    transport: Arc<dyn Transport>,
    references: ResponseCache<ReferenceList>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Gateway {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::debug!("Created gateway for {}", base_url);
        Self {
            base_url,
            transport,
            references: ResponseCache::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a reference catalog, served from the session cache after the first success
    pub async fn reference_list(&self, resource: ReferenceResource) -> Result<Arc<ReferenceList>> {
        let key = format!("{}/{}", REFERENCE_LIST.name, resource);
        if let Some(hit) = self.references.get(&key).await {
            tracing::debug!("Cache hit for {}", key);
            return Ok(hit);
        }

        tracing::debug!("Cache miss for {}", key);
        let list = self
            .send(&REFERENCE_LIST, Some(resource.as_str()), None)
            .await?;
        Ok(self.references.put(key, list).await)
    }

    /// Short-deadline reachability check. Never reads or fills the cache.
    pub async fn probe(&self) -> Result<()> {
        self.send(&HEALTH_PROBE, None, None).await.map(|_| ())
    }

    pub async fn assess(&self, request: &AssessmentRequest) -> Result<Assessment> {
        self.send(&ASSESS, None, Some(request)).await
    }

    pub async fn upload_image(&self, upload: &ImageUpload) -> Result<Document> {
        let envelope = upload.to_envelope();
        tracing::debug!(
            "Uploading {} ({} bytes, {})",
            upload.filename,
            upload.bytes.len(),
            upload.content_type
        );
        self.send(&UPLOAD_IMAGE, None, Some(&envelope)).await
    }

    pub async fn parse_report(&self, request: &ReportRequest) -> Result<Document> {
        self.send(&PARSE_REPORT, None, Some(request)).await
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        self.send(&CHAT, None, Some(request)).await
    }

    /// Single entry point used by the dispatch boundary
    pub async fn call(&self, operation: Operation) -> Result<Reply> {
        match operation {
            Operation::ReferenceList(resource) => {
                self.reference_list(resource).await.map(Reply::References)
            }
            Operation::Assess(request) => self.assess(&request).await.map(Reply::Assessment),
            Operation::UploadImage(upload) => {
                self.upload_image(&upload).await.map(Reply::Document)
            }
            Operation::ParseReport(request) => {
                self.parse_report(&request).await.map(Reply::Document)
            }
            Operation::Chat(request) => self.chat(&request).await.map(Reply::Chat),
        }
    }

    /// Drop every cached catalog; the next fetch of each goes to the network
    pub async fn clear_cache(&self) {
        self.references.invalidate_all().await;
    }

    /// Cache keys currently populated
    pub async fn cached_resources(&self) -> Vec<String> {
        self.references.keys().await
    }

    async fn send<Req, Resp>(
        &self,
        endpoint: &Endpoint<Req, Resp>,
        segment: Option<&str>,
        body: Option<&Req>,
    ) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let request = self.envelope(endpoint, segment, body)?;
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| translate_transport(endpoint.name, e))?;
        decode(endpoint.name, response)
    }

    fn envelope<Req: Serialize, Resp>(
        &self,
        endpoint: &Endpoint<Req, Resp>,
        segment: Option<&str>,
        body: Option<&Req>,
    ) -> Result<TransportRequest> {
        let url = format!("{}{}", self.base_url, endpoint.path_for(segment));
        match (endpoint.method, body) {
            (Method::Post, Some(body)) => {
                let bytes = serde_json::to_vec(body).map_err(|e| GatewayError::ClientError {
                    status: 0,
                    body: format!("{}: failed to encode request: {}", endpoint.name, e),
                })?;
                Ok(TransportRequest::post_json(url, bytes, endpoint.profile))
            }
            (Method::Post, None) => Ok(TransportRequest::post_json(
                url,
                b"{}".to_vec(),
                endpoint.profile,
            )),
            (Method::Get, _) => Ok(TransportRequest::get(url, endpoint.profile)),
        }
    }
}

fn translate_transport(name: &str, error: TransportError) -> GatewayError {
    tracing::debug!("{} failed in transport: {}", name, error);
    match error {
        TransportError::Connect(detail) | TransportError::Io(detail) => {
            GatewayError::Unreachable(detail)
        }
        TransportError::Timeout(detail) => GatewayError::Timeout(detail),
    }
}

/// Error bodies are never decoded into the success shape
fn decode<Resp: DeserializeOwned>(name: &str, response: RawResponse) -> Result<Resp> {
    if !(200..300).contains(&response.status) {
        tracing::debug!("{} returned status {}", name, response.status);
        return Err(GatewayError::from_status(
            response.status,
            response.body_text(),
        ));
    }

    serde_json::from_slice(&response.body).map_err(|e| {
        tracing::debug!("{} returned an undecodable body: {}", name, e);
        GatewayError::MalformedResponse(format!("{}: {}", name, e))
    })
}
