//! Dot-bracket parsing into a validated base-pair table.
//!
//! Each bracket class keeps its own stack, so nesting depth decides the partner
//! of a closing symbol. Classes are `()`, `[]`, `{}`, `<>` and the letter pairs
//! `Aa`..`Zz` used for pseudoknots; `.` marks an unpaired residue.

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BRACKET_CLASSES: [(char, char); 4] = [('(', ')'), ('[', ']'), ('{', '}'), ('<', '>')];
const LETTER_CLASSES: usize = 26;
const CLASS_COUNT: usize = BRACKET_CLASSES.len() + LETTER_CLASSES;
pub const UNPAIRED_SYMBOL: char = '.';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("unmatched closing bracket '{symbol}' at index {index}")]
    UnmatchedClosingBracket { index: usize, symbol: char },
    #[error("unmatched opening bracket at {}", format_indices(.indices))]
    UnmatchedOpeningBracket { indices: Vec<usize> },
    #[error("unexpected symbol '{symbol}' at index {index}")]
    UnexpectedSymbol { index: usize, symbol: char },
    #[error("structure has {structure} positions but the sequence has {sequence}")]
    LengthMismatch { sequence: usize, structure: usize },
    #[error("invalid base pair ({i}, {j}) for a structure of length {length}")]
    InvalidPair { i: usize, j: usize, length: usize },
    #[error("no free bracket class left for the pair opening at index {index}")]
    BracketClassesExhausted { index: usize },
}

fn format_indices(indices: &[usize]) -> String {
    if indices.len() == 1 {
        format!("index {}", indices[0])
    } else {
        format!("indices {}", indices.iter().join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    Open(usize),
    Close(usize),
    Unpaired,
}

fn classify(symbol: char) -> Option<Symbol> {
    if symbol == UNPAIRED_SYMBOL {
        return Some(Symbol::Unpaired);
    }
    if let Some(class) = BRACKET_CLASSES.iter().position(|(open, _)| *open == symbol) {
        return Some(Symbol::Open(class));
    }
    if let Some(class) = BRACKET_CLASSES.iter().position(|(_, close)| *close == symbol) {
        return Some(Symbol::Close(class));
    }
    if symbol.is_ascii_uppercase() {
        return Some(Symbol::Open(
            BRACKET_CLASSES.len() + (symbol as u8 - b'A') as usize,
        ));
    }
    if symbol.is_ascii_lowercase() {
        return Some(Symbol::Close(
            BRACKET_CLASSES.len() + (symbol as u8 - b'a') as usize,
        ));
    }
    None
}

fn class_symbols(class: usize) -> (char, char) {
    match BRACKET_CLASSES.get(class) {
        Some(pair) => *pair,
        None => {
            let offset = (class - BRACKET_CLASSES.len()) as u8;
            ((b'A' + offset) as char, (b'a' + offset) as char)
        }
    }
}

/// Two paired residues, `i < j`, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BasePair {
    pub i: usize,
    pub j: usize,
}

impl BasePair {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            i: a.min(b),
            j: a.max(b),
        }
    }

    fn crosses(&self, other: &BasePair) -> bool {
        (self.i < other.i && other.i < self.j && self.j < other.j)
            || (other.i < self.i && self.i < other.j && other.j < self.j)
    }
}

/// Base pairs of one structure, ascending by opening index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasePairTable {
    length: usize,
    pairs: Vec<BasePair>,
    #[serde(skip)]
    partner: Vec<Option<usize>>,
}

impl BasePairTable {
    pub fn parse(structure: &str) -> Result<Self, StructureError> {
        let mut stacks: Vec<Vec<usize>> = vec![vec![]; CLASS_COUNT];
        let mut pairs = Vec::new();
        let mut length = 0;
        for (index, symbol) in structure.chars().enumerate() {
            length = index + 1;
            match classify(symbol) {
                Some(Symbol::Unpaired) => {}
                Some(Symbol::Open(class)) => stacks[class].push(index),
                Some(Symbol::Close(class)) => match stacks[class].pop() {
                    Some(opening) => pairs.push(BasePair::new(opening, index)),
                    None => return Err(StructureError::UnmatchedClosingBracket { index, symbol }),
                },
                None => return Err(StructureError::UnexpectedSymbol { index, symbol }),
            }
        }

        let leftover: Vec<usize> = stacks.into_iter().flatten().sorted().collect();
        if !leftover.is_empty() {
            return Err(StructureError::UnmatchedOpeningBracket { indices: leftover });
        }

        pairs.sort_unstable();
        debug!(
            "parsed {} base pairs from a structure of length {}",
            pairs.len(),
            length
        );
        Ok(Self::from_sorted(length, pairs))
    }

    /// Parse and check the structure covers exactly `sequence_len` residues.
    pub fn parse_for_sequence(structure: &str, sequence_len: usize) -> Result<Self, StructureError> {
        let table = Self::parse(structure)?;
        if table.len() != sequence_len {
            return Err(StructureError::LengthMismatch {
                sequence: sequence_len,
                structure: table.len(),
            });
        }
        Ok(table)
    }

    /// Build from explicit pairs, enforcing `i < j < length` and one partner per residue.
    pub fn from_pairs(length: usize, pairs: &[BasePair]) -> Result<Self, StructureError> {
        let mut used = vec![false; length];
        let mut sorted = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let invalid = StructureError::InvalidPair {
                i: pair.i,
                j: pair.j,
                length,
            };
            if pair.i >= pair.j || pair.j >= length || used[pair.i] || used[pair.j] {
                return Err(invalid);
            }
            used[pair.i] = true;
            used[pair.j] = true;
            sorted.push(*pair);
        }
        sorted.sort_unstable();
        Ok(Self::from_sorted(length, sorted))
    }

    fn from_sorted(length: usize, pairs: Vec<BasePair>) -> Self {
        let mut partner = vec![None; length];
        for pair in &pairs {
            partner[pair.i] = Some(pair.j);
            partner[pair.j] = Some(pair.i);
        }
        Self {
            length,
            pairs,
            partner,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline(always)]
    pub fn pairs(&self) -> &[BasePair] {
        &self.pairs
    }

    pub fn partner(&self, i: usize) -> Option<usize> {
        if self.partner.len() == self.length {
            self.partner.get(i).copied().flatten()
        } else {
            // Deserialized tables carry no partner index.
            self.pairs.iter().find_map(|p| match (p.i == i, p.j == i) {
                (true, _) => Some(p.j),
                (_, true) => Some(p.i),
                _ => None,
            })
        }
    }

    pub fn is_paired(&self, i: usize) -> bool {
        self.partner(i).is_some()
    }

    pub fn has_pseudoknot(&self) -> bool {
        self.pairs
            .iter()
            .tuple_combinations()
            .any(|(a, b)| a.crosses(b))
    }

    /// Canonical dot-bracket text: each pair, in opening order, gets the
    /// lowest bracket class in which it crosses no earlier pair.
    pub fn to_dot_bracket(&self) -> Result<String, StructureError> {
        let mut out = vec![UNPAIRED_SYMBOL; self.length];
        let mut by_class: Vec<Vec<BasePair>> = vec![vec![]; CLASS_COUNT];
        for pair in &self.pairs {
            let class = by_class
                .iter()
                .position(|members| members.iter().all(|m| !m.crosses(pair)))
                .ok_or(StructureError::BracketClassesExhausted { index: pair.i })?;
            by_class[class].push(*pair);
            let (open, close) = class_symbols(class);
            out[pair.i] = open;
            out[pair.j] = close;
        }
        Ok(out.into_iter().collect())
    }
}

impl PartialEq for BasePairTable {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.pairs == other.pairs
    }
}

impl Eq for BasePairTable {}

/// Parse a dot-bracket string into its base-pair table.
pub fn parse_structure(structure: &str) -> Result<BasePairTable, StructureError> {
    BasePairTable::parse(structure)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(table: &BasePairTable) -> Vec<(usize, usize)> {
        table.pairs().iter().map(|p| (p.i, p.j)).collect()
    }

    #[test]
    fn test_nested_pairs_follow_depth() {
        let table = parse_structure("((..))").unwrap();
        assert_eq!(pairs(&table), vec![(0, 5), (1, 4)]);
        assert_eq!(table.partner(5), Some(0));
        assert_eq!(table.partner(2), None);
    }

    #[test]
    fn test_sibling_hairpins() {
        let table = parse_structure("(.)(..)").unwrap();
        assert_eq!(pairs(&table), vec![(0, 2), (3, 6)]);
    }

    #[test]
    fn test_closing_before_opening_fails_at_zero() {
        assert_eq!(
            parse_structure(")("),
            Err(StructureError::UnmatchedClosingBracket {
                index: 0,
                symbol: ')'
            })
        );
    }

    #[test]
    fn test_every_leftover_opening_is_reported() {
        assert_eq!(
            parse_structure("((.(.)"),
            Err(StructureError::UnmatchedOpeningBracket {
                indices: vec![0, 1]
            })
        );
        assert_eq!(
            parse_structure("[(.)").unwrap_err().to_string(),
            "unmatched opening bracket at index 0"
        );
    }

    #[test]
    fn test_classes_do_not_close_each_other() {
        assert_eq!(
            parse_structure("(]"),
            Err(StructureError::UnmatchedClosingBracket {
                index: 1,
                symbol: ']'
            })
        );
        assert_eq!(
            parse_structure("(.x"),
            Err(StructureError::UnmatchedClosingBracket {
                index: 2,
                symbol: 'x'
            })
        );
        assert_eq!(
            parse_structure("(.#)"),
            Err(StructureError::UnexpectedSymbol {
                index: 2,
                symbol: '#'
            })
        );
    }

    #[test]
    fn test_pseudoknot_pairs_sorted_by_opening() {
        let table = parse_structure("((..[[..))..]]").unwrap();
        assert_eq!(pairs(&table), vec![(0, 9), (1, 8), (4, 13), (5, 12)]);
        assert!(table.has_pseudoknot());
        assert!(!parse_structure("((..))").unwrap().has_pseudoknot());
    }

    #[test]
    fn test_parse_is_stable_and_round_trips() {
        for structure in ["", "....", "((..))..(.)", "((..[[..))..]]", "((<..{A..)..>..}..a)"] {
            let first = parse_structure(structure).unwrap();
            let second = parse_structure(structure).unwrap();
            assert_eq!(first, second);
            let canonical = first.to_dot_bracket().unwrap();
            assert_eq!(canonical.chars().count(), structure.chars().count());
            assert_eq!(parse_structure(&canonical).unwrap().pairs(), first.pairs());
        }
    }

    #[test]
    fn test_canonical_form_normalizes_classes() {
        let table = parse_structure("<<..>>").unwrap();
        assert_eq!(table.to_dot_bracket().unwrap(), "((..))");
        let knot = parse_structure("(A..)a").unwrap();
        assert_eq!(knot.to_dot_bracket().unwrap(), "([..)]");
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            BasePairTable::parse_for_sequence("(..)", 5),
            Err(StructureError::LengthMismatch {
                sequence: 5,
                structure: 4
            })
        );
    }

    #[test]
    fn test_from_pairs_rejects_shared_residue() {
        let ok = BasePairTable::from_pairs(8, &[BasePair::new(6, 1)]).unwrap();
        assert_eq!(pairs(&ok), vec![(1, 6)]);
        assert!(BasePairTable::from_pairs(8, &[BasePair::new(1, 6), BasePair::new(6, 7)]).is_err());
        assert!(BasePairTable::from_pairs(4, &[BasePair::new(1, 6)]).is_err());
        assert!(BasePairTable::from_pairs(4, &[BasePair::new(2, 2)]).is_err());
    }
}
