use crate::{
    annotation::{collect_intervals, AnnotationInterval},
    config::OverlayParameters,
    coordinates::{synthesize_with_layout, CoordinateError, StructureCoordinates},
    error::{OverlayWarning, RiboStructError},
    export::{self, ExportArtifact, ExportError, ExportKind},
    rna_sequence::{RnaSequence, SequenceError},
    rna_structure::{BasePairTable, StructureError},
    scan::{scan_binding_sites, scan_motifs},
    segmenter::{segment_with, Segment, SegmentError},
};
use log::{debug, info, warn};
use rayon::prelude::*;
use ribostruct_protocol::{
    BindingSite, MotifEntity, MotifResponse, RnaSequenceAnalysis, RnaSequenceRecord,
    SmallMolecule, PROTOCOL_VERSION,
};
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

pub type OpId = String;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayRequest {
    pub sequence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Dot-bracket text; absent means no structure is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfe: Option<f64>,
    #[serde(default)]
    pub motifs: Vec<MotifEntity>,
    #[serde(default)]
    pub binding_sites: Vec<BindingSite>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<Vec<f64>>,
    /// Append local motif and binding-site scan hits to the given annotations.
    #[serde(default)]
    pub scan: bool,
}

impl OverlayRequest {
    pub fn new(sequence: &str) -> Self {
        Self {
            sequence: sequence.to_string(),
            ..Self::default()
        }
    }

    /// Combines the analysis and motif service payloads into one request.
    pub fn from_analysis(analysis: &RnaSequenceAnalysis, motifs: Option<&MotifResponse>) -> Self {
        let structure = analysis.structure().trim();
        Self {
            sequence: analysis.sequence.sequence.clone(),
            structure: (!structure.is_empty()).then(|| structure.to_string()),
            mfe: analysis.sequence.mfe,
            motifs: motifs.map(|m| m.entities.clone()).unwrap_or_default(),
            binding_sites: analysis.binding_sites.clone(),
            ..Self::default()
        }
    }

    pub fn load_from_path(path: &str) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path).map_err(|e| EngineError {
            code: ErrorCode::Io,
            message: format!("Could not read request file '{path}': {e}"),
        })?;
        serde_json::from_str(&text).map_err(|e| EngineError {
            code: ErrorCode::InvalidInput,
            message: format!("Could not parse request JSON '{path}': {e}"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayReport {
    pub sequence: RnaSequence,
    /// Dot-bracket as the caller wrote it, trimmed.
    pub structure: Option<String>,
    /// Canonical dot-bracket of `pairs`.
    pub canonical_structure: Option<String>,
    pub mfe: Option<f64>,
    pub pairs: Option<BasePairTable>,
    pub motifs: Vec<MotifEntity>,
    pub binding_sites: Vec<BindingSite>,
    pub segments: Vec<Segment>,
    pub coordinates: StructureCoordinates,
    pub warnings: Vec<OverlayWarning>,
}

impl OverlayReport {
    pub fn record(&self) -> RnaSequenceRecord {
        RnaSequenceRecord {
            sequence: self.sequence.to_string(),
            structure: self.structure.clone(),
            mfe: self.mfe,
        }
    }

    pub fn export(&self, kind: ExportKind) -> Result<ExportArtifact, ExportError> {
        let content = match kind {
            ExportKind::StructureCsv => export::structure_csv(&self.record())?,
            ExportKind::StructureJson => export::structure_json(&self.record())?,
            ExportKind::MotifsCsv => export::motifs_csv(&self.motifs)?,
            ExportKind::MotifsJson => export::motifs_json(&self.motifs)?,
            ExportKind::BindingSitesCsv => export::binding_sites_csv(&self.binding_sites)?,
            ExportKind::BindingSitesJson => export::binding_sites_json(&self.binding_sites)?,
            ExportKind::SegmentsCsv => export::segments_csv(&self.segments)?,
            ExportKind::CoordinatesCsv => {
                export::coordinates_csv(&self.sequence, &self.coordinates)?
            }
            ExportKind::CoordinatesJson => export::coordinates_json(&self.coordinates)?,
            ExportKind::PseudoPdb => export::pseudo_pdb(&self.sequence, &self.coordinates)?,
        };
        Ok(ExportArtifact::new(kind, content))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    ParseStructure {
        structure: String,
        #[serde(default)]
        sequence: Option<String>,
    },
    Segment {
        length: usize,
        #[serde(default)]
        intervals: Vec<AnnotationInterval>,
        #[serde(default)]
        importance: Option<Vec<f64>>,
    },
    SynthesizeCoordinates {
        length: usize,
        #[serde(default)]
        structure: Option<String>,
    },
    ScanMotifs {
        sequence: String,
    },
    ScanBindingSites {
        sequence: String,
        #[serde(default)]
        molecule: Option<SmallMolecule>,
    },
    Overlay {
        request: OverlayRequest,
    },
    Export {
        kind: ExportKind,
        request: OverlayRequest,
    },
}

impl Operation {
    pub const NAMES: [&'static str; 7] = [
        "ParseStructure",
        "Segment",
        "SynthesizeCoordinates",
        "ScanMotifs",
        "ScanBindingSites",
        "Overlay",
        "Export",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpOutput {
    Structure {
        pairs: BasePairTable,
        dot_bracket: String,
        pseudoknotted: bool,
    },
    Segments(Vec<Segment>),
    Coordinates(StructureCoordinates),
    Motifs(Vec<MotifEntity>),
    BindingSites(Vec<BindingSite>),
    Overlay(Box<OverlayReport>),
    Export(ExportArtifact),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpResult {
    pub op_id: OpId,
    pub output: OpOutput,
    pub warnings: Vec<OverlayWarning>,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub op: Operation,
    pub result: OpResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidInput,
    Malformed,
    OutOfRange,
    LimitExceeded,
    Io,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for EngineError {}

impl From<RiboStructError> for EngineError {
    fn from(e: RiboStructError) -> Self {
        let code = match &e {
            RiboStructError::Sequence(_) | RiboStructError::Coordinate(_) => {
                ErrorCode::InvalidInput
            }
            RiboStructError::Structure(_) => ErrorCode::Malformed,
            RiboStructError::Segment(_) => ErrorCode::OutOfRange,
            RiboStructError::Export(ExportError::MalformedRecord { .. }) => ErrorCode::Malformed,
            RiboStructError::Export(ExportError::FieldOverflow { .. }) => ErrorCode::LimitExceeded,
            RiboStructError::Io(_) => ErrorCode::Io,
            RiboStructError::Export(_) | RiboStructError::Serde(_) => ErrorCode::Internal,
        };
        Self {
            code,
            message: e.to_string(),
        }
    }
}

impl From<SequenceError> for EngineError {
    fn from(e: SequenceError) -> Self {
        RiboStructError::from(e).into()
    }
}

impl From<StructureError> for EngineError {
    fn from(e: StructureError) -> Self {
        RiboStructError::from(e).into()
    }
}

impl From<SegmentError> for EngineError {
    fn from(e: SegmentError) -> Self {
        RiboStructError::from(e).into()
    }
}

impl From<CoordinateError> for EngineError {
    fn from(e: CoordinateError) -> Self {
        RiboStructError::from(e).into()
    }
}

impl From<ExportError> for EngineError {
    fn from(e: ExportError) -> Self {
        RiboStructError::from(e).into()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub protocol_version: String,
    pub supported_operations: Vec<String>,
    pub supported_export_formats: Vec<String>,
    pub max_sequence_length: usize,
    pub deterministic: bool,
}

pub trait Engine {
    fn apply(&mut self, op: Operation) -> Result<OpResult, EngineError>;
    /// Independent operations; results come back in input order.
    fn apply_batch(&mut self, ops: Vec<Operation>) -> Vec<Result<OpResult, EngineError>>;
    fn parameters(&self) -> &OverlayParameters;
}

#[derive(Debug, Clone, Default)]
pub struct OverlayEngine {
    parameters: OverlayParameters,
    journal: Vec<OperationRecord>,
    op_counter: u64,
}

impl OverlayEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(parameters: OverlayParameters) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            protocol_version: PROTOCOL_VERSION.to_string(),
            supported_operations: Operation::NAMES.iter().map(|s| s.to_string()).collect(),
            supported_export_formats: ExportKind::ALL
                .iter()
                .map(|k| k.as_str().to_string())
                .collect(),
            max_sequence_length: self.parameters.max_sequence_length,
            deterministic: true,
        }
    }

    pub fn operation_log(&self) -> &[OperationRecord] {
        &self.journal
    }

    fn next_op_id(&mut self) -> OpId {
        self.op_counter += 1;
        format!("op-{}", self.op_counter)
    }

    /// Rejects lengths above `max_sequence_length` with `LimitExceeded`.
    pub fn check_length(&self, length: usize) -> Result<(), EngineError> {
        let max = self.parameters.max_sequence_length;
        if length > max {
            return Err(EngineError {
                code: ErrorCode::LimitExceeded,
                message: format!("Sequence length {length} exceeds the limit of {max}"),
            });
        }
        Ok(())
    }

    pub fn parse_sequence(&self, text: &str) -> Result<RnaSequence, EngineError> {
        let ret = RnaSequence::parse_with(text, self.parameters.normalize_thymine)?;
        self.check_length(ret.len())?;
        Ok(ret)
    }

    fn parse_pairs(
        structure: Option<&str>,
        length: usize,
    ) -> Result<Option<BasePairTable>, EngineError> {
        match structure.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Ok(Some(BasePairTable::parse_for_sequence(s, length)?)),
            None => Ok(None),
        }
    }

    /// Full pipeline: parse, segment and synthesize coordinates for one request.
    pub fn overlay(&self, request: &OverlayRequest) -> Result<OverlayReport, EngineError> {
        let mut sequence = self.parse_sequence(&request.sequence)?;
        if let Some(name) = request.name.as_deref() {
            sequence = sequence.with_name(name);
        }
        let pairs = Self::parse_pairs(request.structure.as_deref(), sequence.len())?;
        let structure = pairs
            .as_ref()
            .and(request.structure.as_deref())
            .map(|s| s.trim().to_string());
        let canonical_structure = pairs.as_ref().map(|t| t.to_dot_bracket()).transpose()?;

        let mut motifs = request.motifs.clone();
        let mut binding_sites = request.binding_sites.clone();
        if request.scan {
            motifs.extend(scan_motifs(&sequence));
            binding_sites.extend(scan_binding_sites(&sequence, None));
        }

        let intervals = collect_intervals(&motifs, &binding_sites);
        let segmentation = segment_with(
            sequence.len(),
            &intervals,
            request.importance.as_deref(),
            self.parameters.segment_options(),
        )?;
        let coordinates =
            synthesize_with_layout(sequence.len(), pairs.as_ref(), &self.parameters.layout)?;

        debug!(
            "overlay of {} residues: {} segments, {} atoms",
            sequence.len(),
            segmentation.segments.len(),
            coordinates.atom_count()
        );
        Ok(OverlayReport {
            sequence,
            structure,
            canonical_structure,
            mfe: request.mfe,
            pairs,
            motifs,
            binding_sites,
            segments: segmentation.segments,
            coordinates,
            warnings: segmentation.warnings,
        })
    }

    pub fn export(
        &self,
        kind: ExportKind,
        request: &OverlayRequest,
    ) -> Result<ExportArtifact, EngineError> {
        Ok(self.overlay(request)?.export(kind)?)
    }

    fn run(&self, op_id: OpId, op: &Operation) -> Result<OpResult, EngineError> {
        let mut warnings = vec![];
        let mut messages = vec![];
        let output = match op {
            Operation::ParseStructure {
                structure,
                sequence,
            } => {
                let pairs = match sequence {
                    Some(text) => {
                        let sequence = self.parse_sequence(text)?;
                        BasePairTable::parse_for_sequence(structure, sequence.len())?
                    }
                    None => {
                        self.check_length(structure.chars().count())?;
                        BasePairTable::parse(structure)?
                    }
                };
                if pairs.is_empty() {
                    warn!("parsing an empty structure");
                    warnings.push(OverlayWarning::EmptyInput);
                }
                let dot_bracket = pairs.to_dot_bracket()?;
                let pseudoknotted = pairs.has_pseudoknot();
                messages.push(format!(
                    "Parsed {} base pairs over {} residues",
                    pairs.pairs().len(),
                    pairs.len()
                ));
                OpOutput::Structure {
                    pairs,
                    dot_bracket,
                    pseudoknotted,
                }
            }
            Operation::Segment {
                length,
                intervals,
                importance,
            } => {
                self.check_length(*length)?;
                let segmentation = segment_with(
                    *length,
                    intervals,
                    importance.as_deref(),
                    self.parameters.segment_options(),
                )?;
                warnings = segmentation.warnings;
                messages.push(format!("Built {} segments", segmentation.segments.len()));
                OpOutput::Segments(segmentation.segments)
            }
            Operation::SynthesizeCoordinates { length, structure } => {
                self.check_length(*length)?;
                let pairs = Self::parse_pairs(structure.as_deref(), *length)?;
                let coordinates =
                    synthesize_with_layout(*length, pairs.as_ref(), &self.parameters.layout)?;
                if *length == 0 {
                    warn!("synthesizing coordinates for an empty sequence");
                    warnings.push(OverlayWarning::EmptyInput);
                }
                messages.push(format!(
                    "Placed {} atoms with {} connections",
                    coordinates.atom_count(),
                    coordinates.connectivity.len()
                ));
                OpOutput::Coordinates(coordinates)
            }
            Operation::ScanMotifs { sequence } => {
                let sequence = self.parse_sequence(sequence)?;
                OpOutput::Motifs(scan_motifs(&sequence))
            }
            Operation::ScanBindingSites { sequence, molecule } => {
                let sequence = self.parse_sequence(sequence)?;
                OpOutput::BindingSites(scan_binding_sites(&sequence, molecule.as_ref()))
            }
            Operation::Overlay { request } => {
                let report = self.overlay(request)?;
                warnings = report.warnings.clone();
                messages.push(format!(
                    "Overlay of {} residues with {} segments",
                    report.sequence.len(),
                    report.segments.len()
                ));
                OpOutput::Overlay(Box::new(report))
            }
            Operation::Export { kind, request } => {
                let report = self.overlay(request)?;
                warnings = report.warnings.clone();
                let artifact = report.export(*kind)?;
                messages.push(format!("Exported {}", artifact.filename));
                OpOutput::Export(artifact)
            }
        };
        Ok(OpResult {
            op_id,
            output,
            warnings,
            messages,
        })
    }
}

impl Engine for OverlayEngine {
    fn apply(&mut self, op: Operation) -> Result<OpResult, EngineError> {
        let op_id = self.next_op_id();
        let result = self.run(op_id, &op)?;
        self.journal.push(OperationRecord {
            op,
            result: result.clone(),
        });
        Ok(result)
    }

    fn apply_batch(&mut self, ops: Vec<Operation>) -> Vec<Result<OpResult, EngineError>> {
        let ids: Vec<OpId> = ops.iter().map(|_| self.next_op_id()).collect();
        info!("evaluating a batch of {} operations", ops.len());
        let engine = &*self;
        let results: Vec<Result<OpResult, EngineError>> = ids
            .into_par_iter()
            .zip(ops.par_iter())
            .map(|(op_id, op)| engine.run(op_id, op))
            .collect();
        for (op, result) in ops.into_iter().zip(&results) {
            if let Ok(result) = result {
                self.journal.push(OperationRecord {
                    op,
                    result: result.clone(),
                });
            }
        }
        results
    }

    fn parameters(&self) -> &OverlayParameters {
        &self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        annotation::{AnnotationKind, MotifClass},
        segmenter::SegmentPayload,
    };

    fn request() -> OverlayRequest {
        OverlayRequest {
            structure: Some("(((...)))".to_string()),
            motifs: vec![MotifEntity {
                start: 3,
                end: 5,
                kind: "hairpin_loop".to_string(),
                label: "loop".to_string(),
            }],
            importance: Some(vec![0.5; 9]),
            ..OverlayRequest::new("GGGAAACCC")
        }
    }

    #[test]
    fn test_overlay_pipeline() {
        let engine = OverlayEngine::new();
        let report = engine.overlay(&request()).unwrap();
        assert_eq!(report.structure.as_deref(), Some("(((...)))"));
        assert_eq!(report.segments.len(), 7);
        assert_eq!(
            report.segments[3].payload,
            SegmentPayload::Annotation {
                source_index: 0,
                label: "loop".to_string(),
                kind: AnnotationKind::Motif(MotifClass::HairpinLoop),
            }
        );
        assert_eq!(report.coordinates.atom_count(), 36);
        assert_eq!(report.coordinates.connectivity.len(), 3);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_thymine_and_scan_flags() {
        let engine = OverlayEngine::new();
        let mut req = OverlayRequest::new("atgggg");
        req.scan = true;
        let report = engine.overlay(&req).unwrap();
        assert_eq!(report.sequence.to_string(), "AUGGGG");
        assert_eq!(report.motifs[0].kind, "start_codon");
        assert_eq!(report.binding_sites[0].label, "Poly-G");

        let strict = OverlayEngine::with_parameters(OverlayParameters {
            normalize_thymine: false,
            ..OverlayParameters::default()
        });
        let err = strict.overlay(&req).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_error_codes() {
        let mut engine = OverlayEngine::with_parameters(OverlayParameters {
            max_sequence_length: 5,
            ..OverlayParameters::default()
        });
        let err = engine.overlay(&request()).unwrap_err();
        assert_eq!(err.code, ErrorCode::LimitExceeded);

        let err = engine
            .apply(Operation::ParseStructure {
                structure: "(()".to_string(),
                sequence: None,
            })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Malformed);

        let err = engine
            .apply(Operation::Segment {
                length: 3,
                intervals: vec![AnnotationInterval::new(
                    2,
                    4,
                    "x",
                    AnnotationKind::Motif(MotifClass::Other),
                )],
                importance: None,
            })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OutOfRange);
        assert!(engine.operation_log().is_empty());
    }

    #[test]
    fn test_parse_structure_operation() {
        let mut engine = OverlayEngine::new();
        let res = engine
            .apply(Operation::ParseStructure {
                structure: "((..[[..))..]]".to_string(),
                sequence: None,
            })
            .unwrap();
        assert_eq!(res.op_id, "op-1");
        match res.output {
            OpOutput::Structure {
                pairs,
                dot_bracket,
                pseudoknotted,
            } => {
                assert_eq!(pairs.pairs().len(), 4);
                assert_eq!(dot_bracket, "((..[[..))..]]");
                assert!(pseudoknotted);
            }
            other => panic!("unexpected output {other:?}"),
        }
        assert_eq!(engine.operation_log().len(), 1);
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let mut engine = OverlayEngine::new();
        let ops: Vec<Operation> = (1..=16)
            .map(|length| Operation::SynthesizeCoordinates {
                length,
                structure: None,
            })
            .chain([Operation::ScanMotifs {
                sequence: "XYZ".to_string(),
            }])
            .collect();
        let results = engine.apply_batch(ops);
        assert_eq!(results.len(), 17);
        for (i, result) in results.iter().take(16).enumerate() {
            let result = result.as_ref().unwrap();
            assert_eq!(result.op_id, format!("op-{}", i + 1));
            match &result.output {
                OpOutput::Coordinates(coords) => assert_eq!(coords.residues.len(), i + 1),
                other => panic!("unexpected output {other:?}"),
            }
        }
        assert!(results[16].is_err());
        assert_eq!(engine.operation_log().len(), 16);
    }

    #[test]
    fn test_export_operation_and_capabilities() {
        let engine = OverlayEngine::new();
        let artifact = engine.export(ExportKind::PseudoPdb, &request()).unwrap();
        assert_eq!(artifact.filename, "structure.pdb");
        assert_eq!(artifact.content.lines().filter(|l| l.starts_with("CONECT")).count(), 3);

        let caps = engine.capabilities();
        assert_eq!(caps.supported_operations.len(), Operation::NAMES.len());
        assert!(caps.supported_export_formats.contains(&"pdb".to_string()));
    }

    #[test]
    fn test_request_from_service_payloads() {
        let analysis: RnaSequenceAnalysis = serde_json::from_value(serde_json::json!({
            "sequence": {"sequence": "GGGAAACCC", "mfe": -1.2},
            "predictedStructure": "(((...)))",
            "bindingSites": [{"start": 0, "end": 2, "confidence": 0.9, "label": "Poly-G"}]
        }))
        .unwrap();
        let req = OverlayRequest::from_analysis(&analysis, None);
        assert_eq!(req.structure.as_deref(), Some("(((...)))"));
        assert_eq!(req.binding_sites.len(), 1);
        let report = OverlayEngine::new().overlay(&req).unwrap();
        assert_eq!(report.record().mfe, Some(-1.2));
        assert_eq!(report.segments[0].end, 2);
    }

    #[test]
    fn test_structure_exports_keep_caller_brackets() {
        let req = OverlayRequest {
            structure: Some(" {{..}} ".to_string()),
            mfe: Some(-0.4),
            ..OverlayRequest::new("GGAACC")
        };
        let report = OverlayEngine::new().overlay(&req).unwrap();
        assert_eq!(report.structure.as_deref(), Some("{{..}}"));
        assert_eq!(report.canonical_structure.as_deref(), Some("((..))"));
        let csv = report.export(ExportKind::StructureCsv).unwrap();
        assert_eq!(csv.content, "Sequence,Structure,MFE\nGGAACC,{{..}},-0.4\n");
        let json = report.export(ExportKind::StructureJson).unwrap();
        assert!(json.content.contains("{{..}}"));

        let report = OverlayEngine::new().overlay(&OverlayRequest::new("GGAACC")).unwrap();
        assert_eq!(report.structure, None);
        assert_eq!(report.canonical_structure, None);
    }

    #[test]
    fn test_empty_structure_and_length_warn() {
        let mut engine = OverlayEngine::new();
        let res = engine
            .apply(Operation::ParseStructure {
                structure: String::new(),
                sequence: None,
            })
            .unwrap();
        assert_eq!(res.warnings, vec![OverlayWarning::EmptyInput]);

        let res = engine
            .apply(Operation::SynthesizeCoordinates {
                length: 0,
                structure: None,
            })
            .unwrap();
        assert_eq!(res.warnings, vec![OverlayWarning::EmptyInput]);
        match res.output {
            OpOutput::Coordinates(coords) => assert!(coords.residues.is_empty()),
            other => panic!("unexpected output {other:?}"),
        }

        let res = engine
            .apply(Operation::SynthesizeCoordinates {
                length: 3,
                structure: None,
            })
            .unwrap();
        assert!(res.warnings.is_empty());
    }

    #[test]
    fn test_parse_sequence_enforces_limit() {
        let engine = OverlayEngine::with_parameters(OverlayParameters {
            max_sequence_length: 4,
            ..OverlayParameters::default()
        });
        assert_eq!(engine.parse_sequence("acgu").unwrap().to_string(), "ACGU");
        let err = engine.parse_sequence("ACGUA").unwrap_err();
        assert_eq!(err.code, ErrorCode::LimitExceeded);
        assert_eq!(engine.check_length(5).unwrap_err().code, ErrorCode::LimitExceeded);
    }

    #[test]
    fn test_pdb_overflow_is_limit_exceeded() {
        let engine = OverlayEngine::with_parameters(OverlayParameters {
            layout: crate::coordinates::CoordinateLayout {
                radius: 1.0e6,
                ..Default::default()
            },
            ..OverlayParameters::default()
        });
        let err = engine
            .export(ExportKind::PseudoPdb, &OverlayRequest::new("GGC"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::LimitExceeded);
    }
}
