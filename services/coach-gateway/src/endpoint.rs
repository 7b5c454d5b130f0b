//! Static descriptors for every remote operation

use std::fmt;
use std::marker::PhantomData;

use crate::document::Document;
use crate::types::{
    Assessment, AssessmentRequest, ChatReply, ChatRequest, ImageEnvelope, ReferenceList,
    ReportRequest,
};

/// HTTP method used by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Which deadline applies to a call.
///
/// Probes fail fast so reachability is detected quickly; compute calls wait
/// long enough for report parsing and chat inference on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutProfile {
    Probe,
    Compute,
}

/// Whether a response may be served from the session cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Immutable for the whole process session
    SessionImmutable,
    Never,
}

/// Descriptor for one remote operation.
///
/// `Req` is the JSON request payload (`()` for bodiless GETs) and `Resp` the
/// shape the 200 body decodes into.
pub struct Endpoint<Req, Resp> {
    pub name: &'static str,
    pub method: Method,
    /// Path relative to the base URL; `{}` is replaced by the resource segment
    pub path: &'static str,
    pub profile: TimeoutProfile,
    pub cache: CachePolicy,
    _payload: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp> Endpoint<Req, Resp> {
    pub const fn new(
        name: &'static str,
        method: Method,
        path: &'static str,
        profile: TimeoutProfile,
        cache: CachePolicy,
    ) -> Self {
        Self {
            name,
            method,
            path,
            profile,
            cache,
            _payload: PhantomData,
        }
    }

    /// Resolve the path, substituting the resource segment if there is one
    pub fn path_for(&self, segment: Option<&str>) -> String {
        match segment {
            Some(segment) => self.path.replacen("{}", segment, 1),
            None => self.path.to_string(),
        }
    }

    pub fn is_cacheable(&self) -> bool {
        self.cache == CachePolicy::SessionImmutable
    }
}

impl<Req, Resp> fmt::Debug for Endpoint<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("profile", &self.profile)
            .field("cache", &self.cache)
            .finish()
    }
}

pub const REFERENCE_LIST: Endpoint<(), ReferenceList> = Endpoint::new(
    "reference",
    Method::Get,
    "/api/{}",
    TimeoutProfile::Compute,
    CachePolicy::SessionImmutable,
);

/// Same resource as the symptom list, but never cached and on the short deadline
pub const HEALTH_PROBE: Endpoint<(), ReferenceList> = Endpoint::new(
    "probe",
    Method::Get,
    "/api/symptoms",
    TimeoutProfile::Probe,
    CachePolicy::Never,
);

pub const ASSESS: Endpoint<AssessmentRequest, Assessment> = Endpoint::new(
    "assess",
    Method::Post,
    "/api/assess",
    TimeoutProfile::Compute,
    CachePolicy::Never,
);

pub const UPLOAD_IMAGE: Endpoint<ImageEnvelope, Document> = Endpoint::new(
    "upload_image",
    Method::Post,
    "/api/images",
    TimeoutProfile::Compute,
    CachePolicy::Never,
);

pub const PARSE_REPORT: Endpoint<ReportRequest, Document> = Endpoint::new(
    "parse_report",
    Method::Post,
    "/api/reports/parse",
    TimeoutProfile::Compute,
    CachePolicy::Never,
);

pub const CHAT: Endpoint<ChatRequest, ChatReply> = Endpoint::new(
    "chat",
    Method::Post,
    "/api/chat",
    TimeoutProfile::Compute,
    CachePolicy::Never,
);
