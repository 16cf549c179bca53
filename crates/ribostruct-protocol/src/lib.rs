//! Wire contracts of the remote analysis and motif services.
//!
//! These types only describe decoded payloads. Nothing in this crate talks to
//! the network; callers fetch, decode into these structs, and hand the data to
//! the `ribostruct` core. Residue coordinates are 0-based and inclusive, as the
//! analysis backend emits them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PROTOCOL_VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Success,
    Error,
}

/// Envelope used by every service endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub status: ApiStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    #[error("remote service reported an error: {0}")]
    Remote(String),
    #[error("remote service reported success without a payload")]
    MissingData,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: ApiStatus::Success,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            status: ApiStatus::Error,
            data: None,
            error: Some(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ApiStatus::Success
    }

    pub fn into_result(self) -> Result<T, ResponseError> {
        match self.status {
            ApiStatus::Success => self.data.ok_or(ResponseError::MissingData),
            ApiStatus::Error => Err(ResponseError::Remote(
                self.error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "An error occurred".to_string()),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RnaSequenceRecord {
    pub sequence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfe: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoleculeProperties {
    pub molecular_weight: f64,
    pub num_atoms: u32,
    pub num_bonds: u32,
    pub num_rotatable_bonds: u32,
    pub num_h_donors: u32,
    pub num_h_acceptors: u32,
    pub log_p: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmallMolecule {
    pub smiles: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<MoleculeProperties>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSite {
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molecule: Option<SmallMolecule>,
    #[serde(default)]
    pub label: String,
}

/// Payload of the analysis endpoints (`/api/analyze`, `/api/predict-binding`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RnaSequenceAnalysis {
    pub sequence: RnaSequenceRecord,
    pub predicted_structure: String,
    #[serde(default)]
    pub binding_sites: Vec<BindingSite>,
    /// Plot traces for the graph renderer; passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<serde_json::Value>,
}

impl RnaSequenceAnalysis {
    /// Structure string to parse: the record's own structure, else the prediction.
    pub fn structure(&self) -> &str {
        self.sequence
            .structure
            .as_deref()
            .unwrap_or(&self.predicted_structure)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotifEntity {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotifResponse {
    #[serde(default)]
    pub entities: Vec<MotifEntity>,
}
