//! Request and response payloads exchanged with the analytics service

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Reference catalogs that do not change within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceResource {
    Symptoms,
    Diseases,
    Treatments,
}

impl ReferenceResource {
    pub const ALL: [ReferenceResource; 3] = [
        ReferenceResource::Symptoms,
        ReferenceResource::Diseases,
        ReferenceResource::Treatments,
    ];

    /// URL segment and cache key suffix
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceResource::Symptoms => "symptoms",
            ReferenceResource::Diseases => "diseases",
            ReferenceResource::Treatments => "treatments",
        }
    }
}

impl fmt::Display for ReferenceResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceResource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "symptoms" => Ok(ReferenceResource::Symptoms),
            "diseases" => Ok(ReferenceResource::Diseases),
            "treatments" => Ok(ReferenceResource::Treatments),
            other => Err(format!("unknown reference resource: {}", other)),
        }
    }
}

/// One entry of a reference catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A whole catalog as returned by the backend (a bare JSON array)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceList {
    pub items: Vec<ReferenceItem>,
}

impl ReferenceList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.name.as_str())
    }
}

/// Input for the submit-and-score operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub age: u32,
    pub gender: String,
    pub symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vitals: BTreeMap<String, f64>,
}

/// Risk band attached to an assessment score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

/// Candidate condition ranked by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionScore {
    pub name: String,
    pub probability: f64,
}

/// Output of the submit-and-score operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub score: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub conditions: Vec<ConditionScore>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Binary payload to upload, kept as raw bytes until it goes on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// JSON envelope with the bytes base64-encoded
    pub fn to_envelope(&self) -> ImageEnvelope {
        ImageEnvelope {
            filename: self.filename.clone(),
            content_type: self.content_type.clone(),
            data: base64::engine::general_purpose::STANDARD.encode(&self.bytes),
        }
    }
}

/// Wire form of an image upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEnvelope {
    pub filename: String,
    pub content_type: String,
    pub data: String,
}

/// Free-text medical report to be structured by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub text: String,
}

/// A message to the health coach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// The coach's answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}
