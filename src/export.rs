//! Pure text exports: CSV, JSON and PDB-style pseudo-molecular records.
//!
//! Nothing here touches the filesystem; callers receive an [`ExportArtifact`]
//! with a suggested filename and MIME type.

use crate::{
    coordinates::{residue_of_serial, StructureCoordinates},
    rna_sequence::RnaSequence,
    rna_structure::BasePair,
    segmenter::Segment,
};
use ribostruct_protocol::{BindingSite, MotifEntity, RnaSequenceRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

const CHAIN_ID: char = 'A';
const OCCUPANCY: f64 = 1.0;
const TEMPERATURE_FACTOR: f64 = 0.0;
const MAX_ATOM_SERIAL: usize = 99_999;
const RESIDUE_NUMBER_WRAP: usize = 10_000;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("export buffer error: {0}")]
    Buffer(String),
    #[error("malformed record on line {line}: {message}")]
    MalformedRecord { line: usize, message: String },
    #[error("{field} {value} of atom {serial} does not fit its PDB column")]
    FieldOverflow {
        field: &'static str,
        value: String,
        serial: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportKind {
    StructureCsv,
    StructureJson,
    MotifsCsv,
    MotifsJson,
    BindingSitesCsv,
    BindingSitesJson,
    SegmentsCsv,
    CoordinatesCsv,
    CoordinatesJson,
    PseudoPdb,
}

impl ExportKind {
    pub const ALL: [ExportKind; 10] = [
        Self::StructureCsv,
        Self::StructureJson,
        Self::MotifsCsv,
        Self::MotifsJson,
        Self::BindingSitesCsv,
        Self::BindingSitesJson,
        Self::SegmentsCsv,
        Self::CoordinatesCsv,
        Self::CoordinatesJson,
        Self::PseudoPdb,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StructureCsv => "structure-csv",
            Self::StructureJson => "structure-json",
            Self::MotifsCsv => "motifs-csv",
            Self::MotifsJson => "motifs-json",
            Self::BindingSitesCsv => "binding-sites-csv",
            Self::BindingSitesJson => "binding-sites-json",
            Self::SegmentsCsv => "segments-csv",
            Self::CoordinatesCsv => "coordinates-csv",
            Self::CoordinatesJson => "coordinates-json",
            Self::PseudoPdb => "pdb",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        let norm = text.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|k| k.as_str() == norm)
    }

    pub fn filename(self) -> &'static str {
        match self {
            Self::StructureCsv => "structure.csv",
            Self::StructureJson => "structure.json",
            Self::MotifsCsv => "motifs.csv",
            Self::MotifsJson => "motifs.json",
            Self::BindingSitesCsv => "binding_sites.csv",
            Self::BindingSitesJson => "binding_sites.json",
            Self::SegmentsCsv => "segments.csv",
            Self::CoordinatesCsv => "coordinates.csv",
            Self::CoordinatesJson => "coordinates.json",
            Self::PseudoPdb => "structure.pdb",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::StructureCsv
            | Self::MotifsCsv
            | Self::BindingSitesCsv
            | Self::SegmentsCsv
            | Self::CoordinatesCsv => "text/csv",
            Self::StructureJson
            | Self::MotifsJson
            | Self::BindingSitesJson
            | Self::CoordinatesJson => "application/json",
            Self::PseudoPdb => "chemical/x-pdb",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime_type: String,
    pub content: String,
}

impl ExportArtifact {
    pub fn new(kind: ExportKind, content: String) -> Self {
        Self {
            filename: kind.filename().to_string(),
            mime_type: kind.mime_type().to_string(),
            content,
        }
    }
}

fn write_csv<const N: usize>(
    header: [&str; N],
    rows: impl IntoIterator<Item = [String; N]>,
) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn structure_csv(record: &RnaSequenceRecord) -> Result<String, ExportError> {
    write_csv(
        ["Sequence", "Structure", "MFE"],
        [[
            record.sequence.clone(),
            record.structure.clone().unwrap_or_default(),
            optional_number(record.mfe),
        ]],
    )
}

pub fn structure_json(record: &RnaSequenceRecord) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(record)?)
}

pub fn motifs_csv(entities: &[MotifEntity]) -> Result<String, ExportError> {
    write_csv(
        ["Start", "End", "Type", "Label"],
        entities.iter().map(|e| {
            [
                e.start.to_string(),
                e.end.to_string(),
                e.kind.clone(),
                e.label.clone(),
            ]
        }),
    )
}

pub fn motifs_json(entities: &[MotifEntity]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(entities)?)
}

pub fn binding_sites_csv(sites: &[BindingSite]) -> Result<String, ExportError> {
    write_csv(
        ["Start", "End", "Confidence", "Molecule", "Label"],
        sites.iter().map(|s| {
            [
                s.start.to_string(),
                s.end.to_string(),
                s.confidence.to_string(),
                s.molecule
                    .as_ref()
                    .and_then(|m| m.name.clone())
                    .unwrap_or_default(),
                s.label.clone(),
            ]
        }),
    )
}

pub fn binding_sites_json(sites: &[BindingSite]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(sites)?)
}

pub fn segments_csv(segments: &[Segment]) -> Result<String, ExportError> {
    write_csv(
        ["Start", "End", "Kind", "Label", "Value"],
        segments.iter().map(|s| {
            [
                s.start.to_string(),
                s.end.to_string(),
                s.render_kind().as_str().to_string(),
                s.label().unwrap_or_default().to_string(),
                s.intensity().to_string(),
            ]
        }),
    )
}

pub fn coordinates_csv(
    sequence: &RnaSequence,
    coords: &StructureCoordinates,
) -> Result<String, ExportError> {
    write_csv(
        ["Residue", "Symbol", "Atom", "Serial", "X", "Y", "Z"],
        coords.atoms().map(|a| {
            [
                (a.residue_index + 1).to_string(),
                sequence.symbol_or_n(a.residue_index).to_string(),
                a.name.as_str().to_string(),
                a.serial.to_string(),
                format!("{:.3}", a.position.x),
                format!("{:.3}", a.position.y),
                format!("{:.3}", a.position.z),
            ]
        }),
    )
}

pub fn coordinates_json(coords: &StructureCoordinates) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(coords)?)
}

/// PDB-style text: ATOM records in fixed columns, one CONECT per base pair, END.
///
/// Residue numbers wrap at 10000 as in other PDB writers; serials and
/// coordinates that do not fit their columns are an error.
pub fn pseudo_pdb(
    sequence: &RnaSequence,
    coords: &StructureCoordinates,
) -> Result<String, ExportError> {
    let mut out = String::with_capacity(coords.atom_count() * 81 + 16);
    for atom in coords.atoms() {
        check_serial(atom.serial)?;
        let name = atom.name.as_str();
        let element = name.chars().next().unwrap_or('X');
        out.push_str(&format!(
            "ATOM  {:>5} {:<4} {:>3} {}{:>4}    {}{}{}{:>6.2}{:>6.2}          {:>2}\n",
            atom.serial,
            format!(" {name}"),
            sequence.symbol_or_n(atom.residue_index),
            CHAIN_ID,
            (atom.residue_index + 1) % RESIDUE_NUMBER_WRAP,
            coordinate_field(atom.position.x, atom.serial)?,
            coordinate_field(atom.position.y, atom.serial)?,
            coordinate_field(atom.position.z, atom.serial)?,
            OCCUPANCY,
            TEMPERATURE_FACTOR,
            element,
        ));
    }
    for link in &coords.connectivity {
        check_serial(link.from_serial)?;
        check_serial(link.to_serial)?;
        out.push_str(&format!("CONECT{:>5}{:>5}\n", link.from_serial, link.to_serial));
    }
    out.push_str("END\n");
    Ok(out)
}

fn check_serial(serial: usize) -> Result<(), ExportError> {
    if serial > MAX_ATOM_SERIAL {
        return Err(ExportError::FieldOverflow {
            field: "atom serial",
            value: serial.to_string(),
            serial,
        });
    }
    Ok(())
}

fn coordinate_field(value: f64, serial: usize) -> Result<String, ExportError> {
    let text = format!("{value:>8.3}");
    if text.len() > 8 {
        return Err(ExportError::FieldOverflow {
            field: "coordinate",
            value: text.trim().to_string(),
            serial,
        });
    }
    Ok(text)
}

fn column(line: &str, from: usize, to: usize) -> Option<&str> {
    line.get(from..to.min(line.len())).map(str::trim)
}

fn parse_serial(line: &str, line_no: usize, from: usize, to: usize) -> Result<usize, ExportError> {
    column(line, from, to)
        .and_then(|v| v.parse::<usize>().ok())
        .ok_or_else(|| ExportError::MalformedRecord {
            line: line_no,
            message: format!("no atom serial in columns {}-{}", from + 1, to),
        })
}

/// Recover base pairs from the CONECT records of a [`pseudo_pdb`] text.
///
/// Residues are counted in ATOM order, a new one starting whenever the
/// residue name, chain or number changes, so wrapped residue numbers still
/// resolve to the right index.
pub fn parse_connectivity(text: &str) -> Result<Vec<BasePair>, ExportError> {
    let mut residue_by_serial: HashMap<usize, usize> = HashMap::new();
    let mut links = vec![];
    let mut current_residue: Option<(usize, &str)> = None;
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.starts_with("ATOM  ") {
            let serial = parse_serial(line, line_no, 6, 11)?;
            column(line, 22, 26)
                .and_then(|v| v.parse::<usize>().ok())
                .ok_or_else(|| ExportError::MalformedRecord {
                    line: line_no,
                    message: "no residue number in columns 23-26".to_string(),
                })?;
            let key = line.get(17..27).unwrap_or_default();
            let residue = match current_residue {
                Some((residue, prev)) if prev == key => residue,
                Some((residue, _)) => residue + 1,
                None => 0,
            };
            current_residue = Some((residue, key));
            residue_by_serial.insert(serial, residue);
        } else if line.starts_with("CONECT") {
            let from = parse_serial(line, line_no, 6, 11)?;
            let to = parse_serial(line, line_no, 11, 16)?;
            links.push((line_no, from, to));
        }
    }

    let mut pairs = Vec::with_capacity(links.len());
    for (line_no, from, to) in links {
        let resolve = |serial: usize| {
            residue_by_serial
                .get(&serial)
                .copied()
                .or_else(|| {
                    // Bare CONECT text: fall back to the fixed atoms-per-residue layout.
                    residue_by_serial
                        .is_empty()
                        .then(|| residue_of_serial(serial))
                        .flatten()
                })
                .ok_or_else(|| ExportError::MalformedRecord {
                    line: line_no,
                    message: format!("CONECT references unknown atom {serial}"),
                })
        };
        pairs.push(BasePair::new(resolve(from)?, resolve(to)?));
    }
    pairs.sort_unstable();
    Ok(pairs)
}
