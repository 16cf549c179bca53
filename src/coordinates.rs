//! Deterministic placeholder coordinates for structural export.
//!
//! Residue `i` of `L` sits on a circle of radius `R` at angle `2πi/L` in the
//! z = 0 plane. Each residue carries four pseudo-atoms shifted along +x; the
//! phosphate is the representative atom used for base-pair connectivity.
//! Values are snapped to a 1e-3 grid so every export prints plain decimals.

use crate::rna_structure::{BasePair, BasePairTable};
use log::debug;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

pub const DEFAULT_RADIUS: f64 = 10.0;
pub const ATOMS_PER_RESIDUE: usize = 4;
pub const REPRESENTATIVE_ATOM: AtomName = AtomName::P;
const GRID: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("base-pair table covers {table_length} residues but {length} were requested")]
    PairTableLengthMismatch { length: usize, table_length: usize },
    #[error("invalid coordinate layout: {message}")]
    InvalidLayout { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomName {
    P,
    #[serde(rename = "O5'")]
    O5,
    #[serde(rename = "C5'")]
    C5,
    N1,
}

impl AtomName {
    pub const ALL: [AtomName; ATOMS_PER_RESIDUE] = [Self::P, Self::O5, Self::C5, Self::N1];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::P => "P",
            Self::O5 => "O5'",
            Self::C5 => "C5'",
            Self::N1 => "N1",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == text.trim())
    }

    #[inline(always)]
    pub fn slot(self) -> usize {
        match self {
            Self::P => 0,
            Self::O5 => 1,
            Self::C5 => 2,
            Self::N1 => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateLayout {
    pub radius: f64,
    /// Offsets along +x for P, O5', C5', N1; increasing by at least one grid step.
    pub atom_offsets: [f64; ATOMS_PER_RESIDUE],
}

impl Default for CoordinateLayout {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            atom_offsets: [0.0, 1.0, 2.0, 3.0],
        }
    }
}

impl CoordinateLayout {
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(CoordinateError::InvalidLayout {
                message: format!("radius must be positive and finite, got {}", self.radius),
            });
        }
        if self.atom_offsets.iter().any(|o| !o.is_finite())
            || self.atom_offsets.windows(2).any(|w| w[1] - w[0] < 1.0 / GRID)
        {
            return Err(CoordinateError::InvalidLayout {
                message: format!(
                    "atom offsets must be finite and increase by at least 0.001, got {:?}",
                    self.atom_offsets
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[inline(always)]
fn snap(v: f64) -> f64 {
    // `+ 0.0` turns -0.0 into 0.0.
    (v * GRID).round() / GRID + 0.0
}

impl Point3 {
    fn snapped(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: snap(x),
            y: snap(y),
            z: snap(z),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomRecord {
    /// Global, 1-based, consecutive across the whole structure.
    pub serial: usize,
    pub name: AtomName,
    pub residue_index: usize,
    pub position: Point3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateRecord {
    pub residue_index: usize,
    pub position: Point3,
    pub atoms: Vec<AtomRecord>,
}

impl CoordinateRecord {
    pub fn atom(&self, name: AtomName) -> Option<&AtomRecord> {
        self.atoms.get(name.slot()).filter(|a| a.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connectivity {
    pub from_serial: usize,
    pub to_serial: usize,
    pub pair: BasePair,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureCoordinates {
    pub residues: Vec<CoordinateRecord>,
    pub connectivity: Vec<Connectivity>,
}

impl StructureCoordinates {
    pub fn atoms(&self) -> impl Iterator<Item = &AtomRecord> {
        self.residues.iter().flat_map(|r| r.atoms.iter())
    }

    pub fn atom_count(&self) -> usize {
        self.residues.iter().map(|r| r.atoms.len()).sum()
    }
}

/// Serial of atom `name` on residue `residue_index`.
#[inline(always)]
pub fn atom_serial(residue_index: usize, name: AtomName) -> usize {
    residue_index * ATOMS_PER_RESIDUE + name.slot() + 1
}

/// Inverse of [`atom_serial`] for any serial ≥ 1.
pub fn residue_of_serial(serial: usize) -> Option<usize> {
    serial.checked_sub(1).map(|s| s / ATOMS_PER_RESIDUE)
}

pub fn synthesize_coordinates(
    length: usize,
    pairs: Option<&BasePairTable>,
) -> Result<StructureCoordinates, CoordinateError> {
    synthesize_with_layout(length, pairs, &CoordinateLayout::default())
}

pub fn synthesize_with_layout(
    length: usize,
    pairs: Option<&BasePairTable>,
    layout: &CoordinateLayout,
) -> Result<StructureCoordinates, CoordinateError> {
    layout.validate()?;
    if let Some(table) = pairs {
        if table.len() != length {
            return Err(CoordinateError::PairTableLengthMismatch {
                length,
                table_length: table.len(),
            });
        }
    }

    let divisor = length.max(1) as f64;
    let residues: Vec<CoordinateRecord> = (0..length)
        .map(|residue_index| {
            let theta = 2.0 * PI * residue_index as f64 / divisor;
            let x = layout.radius * theta.cos();
            let y = layout.radius * theta.sin();
            let atoms = AtomName::ALL
                .iter()
                .map(|&name| AtomRecord {
                    serial: atom_serial(residue_index, name),
                    name,
                    residue_index,
                    position: Point3::snapped(x + layout.atom_offsets[name.slot()], y, 0.0),
                })
                .collect();
            CoordinateRecord {
                residue_index,
                position: Point3::snapped(x, y, 0.0),
                atoms,
            }
        })
        .collect();

    let connectivity: Vec<Connectivity> = pairs
        .map(|table| {
            table
                .pairs()
                .iter()
                .map(|pair| Connectivity {
                    from_serial: atom_serial(pair.i, REPRESENTATIVE_ATOM),
                    to_serial: atom_serial(pair.j, REPRESENTATIVE_ATOM),
                    pair: *pair,
                })
                .collect()
        })
        .unwrap_or_default();

    debug!(
        "synthesized {} residues, {} atoms, {} connections",
        residues.len(),
        residues.len() * ATOMS_PER_RESIDUE,
        connectivity.len()
    );
    Ok(StructureCoordinates {
        residues,
        connectivity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rna_structure::parse_structure;

    #[test]
    fn test_four_residues_on_the_circle() {
        let coords = synthesize_coordinates(4, None).unwrap();
        let points: Vec<(f64, f64, f64)> = coords
            .residues
            .iter()
            .map(|r| (r.position.x, r.position.y, r.position.z))
            .collect();
        assert_eq!(
            points,
            vec![
                (10.0, 0.0, 0.0),
                (0.0, 10.0, 0.0),
                (-10.0, 0.0, 0.0),
                (0.0, -10.0, 0.0)
            ]
        );
        assert!(coords.residues[3].position.x.is_sign_positive());
    }

    #[test]
    fn test_repeated_calls_are_bit_identical() {
        let a = synthesize_coordinates(8, None).unwrap();
        let b = synthesize_coordinates(8, None).unwrap();
        let bits = |c: &StructureCoordinates| {
            c.atoms()
                .flat_map(|a| [a.position.x.to_bits(), a.position.y.to_bits()])
                .collect::<Vec<u64>>()
        };
        assert_eq!(bits(&a), bits(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_degenerate_lengths() {
        assert!(synthesize_coordinates(0, None).unwrap().residues.is_empty());
        let single = synthesize_coordinates(1, None).unwrap();
        assert_eq!(single.residues.len(), 1);
        assert_eq!(single.residues[0].position, Point3 { x: 10.0, y: 0.0, z: 0.0 });
    }

    #[test]
    fn test_atom_serials_are_global_and_offsets_distinct() {
        let coords = synthesize_coordinates(3, None).unwrap();
        let serials: Vec<usize> = coords.atoms().map(|a| a.serial).collect();
        assert_eq!(serials, (1..=12).collect::<Vec<_>>());
        let residue = &coords.residues[2];
        let xs: Vec<f64> = residue.atoms.iter().map(|a| a.position.x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(residue.atom(AtomName::N1).unwrap().serial, 12);
        for serial in serials {
            let atom = coords.atoms().find(|a| a.serial == serial).unwrap();
            assert_eq!(residue_of_serial(serial), Some(atom.residue_index));
        }
    }

    #[test]
    fn test_connectivity_uses_parsed_pairs() {
        let table = parse_structure("((.(..))).").unwrap();
        let coords = synthesize_coordinates(10, Some(&table)).unwrap();
        let links: Vec<(usize, usize)> = coords
            .connectivity
            .iter()
            .map(|c| (c.from_serial, c.to_serial))
            .collect();
        // (0,8), (1,7), (3,6): nested partners, not the nearest closing bracket.
        assert_eq!(links, vec![(1, 33), (5, 29), (13, 25)]);
    }

    #[test]
    fn test_rejects_mismatched_table_and_bad_layout() {
        let table = parse_structure("(..)").unwrap();
        assert_eq!(
            synthesize_coordinates(5, Some(&table)),
            Err(CoordinateError::PairTableLengthMismatch {
                length: 5,
                table_length: 4
            })
        );
        let layout = CoordinateLayout {
            radius: 10.0,
            atom_offsets: [0.0, 1.0, 1.0, 2.0],
        };
        assert!(synthesize_with_layout(4, None, &layout).is_err());
    }
}
