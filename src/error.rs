use crate::{
    coordinates::CoordinateError, export::ExportError, rna_sequence::SequenceError,
    rna_structure::StructureError, segmenter::SegmentError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiboStructError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error("malformed structure: {0}")]
    Structure(#[from] StructureError),
    #[error(transparent)]
    Segment(#[from] SegmentError),
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Conditions that do not stop a computation but are reported with its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "camelCase")]
pub enum OverlayWarning {
    EmptyInput,
    ImportanceShorter { expected: usize, found: usize },
    ImportanceClamped { index: usize, value: f64 },
}

impl fmt::Display for OverlayWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "sequence is empty; outputs are empty"),
            Self::ImportanceShorter { expected, found } => write!(
                f,
                "importance vector has {found} values for {expected} residues; missing values read as 0"
            ),
            Self::ImportanceClamped { index, value } => write!(
                f,
                "importance value {value} at index {index} is outside [0, 1] and was clamped"
            ),
        }
    }
}
