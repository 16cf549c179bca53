//! Local motif and binding-site scanning.
//!
//! Produces the same payloads the analysis service returns, with 0-based
//! inclusive coordinates, so results feed straight into the segmenter.

use crate::{
    annotation::{BindingSiteClass, MotifClass},
    rna_sequence::RnaSequence,
};
use log::debug;
use regex::Regex;
use ribostruct_protocol::{BindingSite, MotifEntity, SmallMolecule};
use std::sync::OnceLock;

pub const BINDING_SITE_CONFIDENCE: f64 = 0.9;

struct MotifPattern {
    class: MotifClass,
    label: &'static str,
    regex: Regex,
}

struct SitePattern {
    class: BindingSiteClass,
    regex: Regex,
}

// Scan order is part of the output order.
const MOTIF_PATTERNS: [(MotifClass, &str, &str); 7] = [
    (MotifClass::StartCodon, "Start Codon (AUG)", "AUG"),
    (MotifClass::StopCodon, "Stop Codon (UAA)", "UAA"),
    (MotifClass::StopCodon, "Stop Codon (UAG)", "UAG"),
    (MotifClass::StopCodon, "Stop Codon (UGA)", "UGA"),
    (MotifClass::PolyU, "Poly-U (UUU)", "UUU"),
    (MotifClass::PolyG, "Poly-G (GGG)", "GGG"),
    (MotifClass::HairpinLoop, "Hairpin Loop (GNNNNNCC)", "G[ACGU]{5}CC"),
];

static MOTIFS: OnceLock<Vec<MotifPattern>> = OnceLock::new();
static SITES: OnceLock<Vec<SitePattern>> = OnceLock::new();

fn motif_patterns() -> &'static [MotifPattern] {
    MOTIFS.get_or_init(|| {
        MOTIF_PATTERNS
            .iter()
            .filter_map(|(class, label, pattern)| {
                Regex::new(pattern).ok().map(|regex| MotifPattern {
                    class: *class,
                    label: *label,
                    regex,
                })
            })
            .collect()
    })
}

fn site_patterns() -> &'static [SitePattern] {
    SITES.get_or_init(|| {
        BindingSiteClass::ALL
            .iter()
            .filter_map(|class| {
                let nucleotide = class.nucleotide()?;
                Regex::new(&format!("{nucleotide}{{3,}}"))
                    .ok()
                    .map(|regex| SitePattern {
                        class: *class,
                        regex,
                    })
            })
            .collect()
    })
}

fn sequence_text(sequence: &RnaSequence) -> &str {
    // Validated sequences only hold ASCII A, C, G and U.
    std::str::from_utf8(sequence.as_bytes()).unwrap_or_default()
}

/// Non-overlapping matches of each motif pattern, pattern by pattern.
pub fn scan_motifs(sequence: &RnaSequence) -> Vec<MotifEntity> {
    let text = sequence_text(sequence);
    let ret: Vec<MotifEntity> = motif_patterns()
        .iter()
        .flat_map(|pattern| {
            pattern.regex.find_iter(text).map(|m| MotifEntity {
                start: m.start(),
                end: m.end() - 1,
                kind: pattern.class.as_str().to_string(),
                label: pattern.label.to_string(),
            })
        })
        .collect();
    debug!("found {} motifs in {} residues", ret.len(), sequence.len());
    ret
}

/// Homopolymer runs of at least three residues, G then C then A then U.
pub fn scan_binding_sites(
    sequence: &RnaSequence,
    molecule: Option<&SmallMolecule>,
) -> Vec<BindingSite> {
    let text = sequence_text(sequence);
    let ret: Vec<BindingSite> = site_patterns()
        .iter()
        .flat_map(|pattern| {
            pattern.regex.find_iter(text).map(|m| BindingSite {
                start: m.start(),
                end: m.end() - 1,
                confidence: BINDING_SITE_CONFIDENCE,
                molecule: molecule.cloned(),
                label: pattern.class.as_str().to_string(),
            })
        })
        .collect();
    debug!(
        "found {} binding sites in {} residues",
        ret.len(),
        sequence.len()
    );
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rna(text: &str) -> RnaSequence {
        RnaSequence::parse(text).unwrap()
    }

    #[test]
    fn test_motif_scan_order_and_coordinates() {
        let motifs = scan_motifs(&rna("AUGGGGUAAUUUU"));
        let found: Vec<(usize, usize, &str)> = motifs
            .iter()
            .map(|m| (m.start, m.end, m.kind.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (0, 2, "start_codon"),
                (6, 8, "stop_codon"),
                (9, 11, "poly_U"),
                (2, 4, "poly_G"),
            ]
        );
        assert_eq!(motifs[1].label, "Stop Codon (UAA)");
    }

    #[test]
    fn test_hairpin_loop_pattern() {
        let motifs = scan_motifs(&rna("AGAAAAACCA"));
        assert_eq!(motifs.len(), 1);
        assert_eq!(motifs[0].kind, "hairpin_loop");
        assert_eq!((motifs[0].start, motifs[0].end), (1, 8));
    }

    #[test]
    fn test_binding_site_runs() {
        let molecule = SmallMolecule {
            smiles: "CCO".to_string(),
            name: Some("ethanol".to_string()),
            properties: None,
        };
        let sites = scan_binding_sites(&rna("AAAACCGGGGGUU"), Some(&molecule));
        let found: Vec<(usize, usize, &str)> = sites
            .iter()
            .map(|s| (s.start, s.end, s.label.as_str()))
            .collect();
        assert_eq!(found, vec![(6, 10, "Poly-G"), (0, 3, "Poly-A")]);
        assert!(sites.iter().all(|s| s.confidence == BINDING_SITE_CONFIDENCE));
        assert_eq!(
            sites[0].molecule.as_ref().and_then(|m| m.name.as_deref()),
            Some("ethanol")
        );
    }

    #[test]
    fn test_empty_sequence_has_no_hits() {
        let empty = RnaSequence::default();
        assert!(scan_motifs(&empty).is_empty());
        assert!(scan_binding_sites(&empty, None).is_empty());
    }
}
