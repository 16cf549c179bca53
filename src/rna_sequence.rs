use anyhow::Result;
use bio::io::fasta;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, fs::File};
use thiserror::Error;

type RnaString = Vec<u8>;

pub const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'U'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("invalid nucleotide '{symbol}' at index {index}; only A, C, G and U are allowed")]
    InvalidNucleotide { index: usize, symbol: char },
}

/// A validated RNA sequence over {A, C, G, U}. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RnaSequence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(
        serialize_with = "serialize_residues",
        deserialize_with = "deserialize_residues"
    )]
    seq: RnaString,
}

fn serialize_residues<S: Serializer>(seq: &RnaString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(seq))
}

fn deserialize_residues<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RnaString, D::Error> {
    let text = String::deserialize(deserializer)?;
    RnaSequence::parse(&text)
        .map(|rna| rna.seq)
        .map_err(serde::de::Error::custom)
}

impl RnaSequence {
    /// Strict parse: upper-cases and drops whitespace, keeps T as an error.
    pub fn parse(text: &str) -> Result<Self, SequenceError> {
        Self::parse_with(text, false)
    }

    /// Parse, optionally rewriting DNA thymine to uracil first.
    pub fn parse_with(text: &str, normalize_thymine: bool) -> Result<Self, SequenceError> {
        let mut seq = RnaString::with_capacity(text.len());
        for c in text.chars().filter(|c| !c.is_ascii_whitespace()) {
            let upper = match c.to_ascii_uppercase() {
                'T' if normalize_thymine => 'U',
                other => other,
            };
            if !upper.is_ascii() || !NUCLEOTIDES.contains(&(upper as u8)) {
                return Err(SequenceError::InvalidNucleotide {
                    index: seq.len(),
                    symbol: c,
                });
            }
            seq.push(upper as u8);
        }
        Ok(Self { name: None, seq })
    }

    pub fn from_fasta_file(filename: &str, normalize_thymine: bool) -> Result<Vec<Self>> {
        let file = File::open(filename)?;
        let mut ret = vec![];
        for record in fasta::Reader::new(file).records() {
            let record = record?;
            let text = String::from_utf8_lossy(record.seq());
            let mut rna = Self::parse_with(&text, normalize_thymine)?;
            rna.name = Some(record.id().to_string());
            ret.push(rna);
        }
        Ok(ret)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.seq
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Residue symbol at `i`, `N` when out of range.
    #[inline(always)]
    pub fn symbol_or_n(&self, i: usize) -> char {
        self.seq.get(i).map(|b| *b as char).unwrap_or('N')
    }
}

impl fmt::Display for RnaSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let rna = RnaSequence::parse(" gca\nUGc ").unwrap();
        assert_eq!(rna.to_string(), "GCAUGC");
        assert_eq!(rna.len(), 6);
    }

    #[test]
    fn test_parse_rejects_foreign_symbols() {
        assert_eq!(
            RnaSequence::parse("ACGX"),
            Err(SequenceError::InvalidNucleotide {
                index: 3,
                symbol: 'X'
            })
        );
        assert!(RnaSequence::parse("ACGT").is_err());
        assert_eq!(
            RnaSequence::parse_with("ACGT", true).unwrap().to_string(),
            "ACGU"
        );
    }

    #[test]
    fn test_empty_sequence_is_valid() {
        let rna = RnaSequence::parse("").unwrap();
        assert!(rna.is_empty());
        assert_eq!(rna.symbol_or_n(0), 'N');
    }

    #[test]
    fn test_from_fasta_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ">first test\nGGGAAA\nCCC\n>second\nacgt").unwrap();
        let records =
            RnaSequence::from_fasta_file(file.path().to_str().unwrap(), true).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name(), Some("first"));
        assert_eq!(records[0].to_string(), "GGGAAACCC");
        assert_eq!(records[1].to_string(), "ACGU");
    }

    #[test]
    fn test_json_shape() {
        let rna = RnaSequence::parse("GGAU").unwrap().with_name("probe");
        let value = serde_json::to_value(&rna).unwrap();
        assert_eq!(value, serde_json::json!({"name": "probe", "seq": "GGAU"}));
        let back: RnaSequence = serde_json::from_value(value).unwrap();
        assert_eq!(back, rna);
        assert!(serde_json::from_str::<RnaSequence>(r#"{"seq": "GGXU"}"#).is_err());
    }
}
