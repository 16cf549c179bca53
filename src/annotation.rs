//! Discrete annotation intervals and their display styles.

use ribostruct_protocol::{BindingSite, MotifEntity};
use serde::{Deserialize, Serialize};

const DEFAULT_MOTIF_COLOR: &str = "#90caf9";
const DEFAULT_BINDING_SITE_COLOR: &str = "#1976d2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationStyle {
    pub color: &'static str,
    pub legend: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotifClass {
    #[serde(rename = "start_codon")]
    StartCodon,
    #[serde(rename = "stop_codon")]
    StopCodon,
    #[serde(rename = "poly_U")]
    PolyU,
    #[serde(rename = "poly_G")]
    PolyG,
    #[serde(rename = "hairpin_loop")]
    HairpinLoop,
    #[serde(rename = "other")]
    Other,
}

impl MotifClass {
    pub const ALL: [MotifClass; 5] = [
        Self::StartCodon,
        Self::StopCodon,
        Self::PolyU,
        Self::PolyG,
        Self::HairpinLoop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartCodon => "start_codon",
            Self::StopCodon => "stop_codon",
            Self::PolyU => "poly_U",
            Self::PolyG => "poly_G",
            Self::HairpinLoop => "hairpin_loop",
            Self::Other => "other",
        }
    }

    /// Unknown motif types map to `Other` instead of failing.
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "start_codon" => Self::StartCodon,
            "stop_codon" => Self::StopCodon,
            "poly_U" => Self::PolyU,
            "poly_G" => Self::PolyG,
            "hairpin_loop" => Self::HairpinLoop,
            _ => Self::Other,
        }
    }

    pub fn style(self) -> AnnotationStyle {
        let (color, legend) = match self {
            Self::StartCodon => ("#1976d2", "Start Codon (AUG)"),
            Self::StopCodon => ("#d32f2f", "Stop Codon (UAA/UAG/UGA)"),
            Self::PolyU => ("#fbc02d", "Poly-U (UUU)"),
            Self::PolyG => ("#388e3c", "Poly-G (GGG)"),
            Self::HairpinLoop => ("#7b1fa2", "Hairpin Loop (GNNNNNCC)"),
            Self::Other => (DEFAULT_MOTIF_COLOR, "Motif"),
        };
        AnnotationStyle { color, legend }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingSiteClass {
    #[serde(rename = "Poly-G")]
    PolyG,
    #[serde(rename = "Poly-C")]
    PolyC,
    #[serde(rename = "Poly-A")]
    PolyA,
    #[serde(rename = "Poly-U")]
    PolyU,
    #[serde(rename = "Other")]
    Other,
}

impl BindingSiteClass {
    pub const ALL: [BindingSiteClass; 4] = [Self::PolyG, Self::PolyC, Self::PolyA, Self::PolyU];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PolyG => "Poly-G",
            Self::PolyC => "Poly-C",
            Self::PolyA => "Poly-A",
            Self::PolyU => "Poly-U",
            Self::Other => "Other",
        }
    }

    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "Poly-G" => Self::PolyG,
            "Poly-C" => Self::PolyC,
            "Poly-A" => Self::PolyA,
            "Poly-U" => Self::PolyU,
            _ => Self::Other,
        }
    }

    /// Nucleotide repeated by this site class, if any.
    pub fn nucleotide(self) -> Option<char> {
        match self {
            Self::PolyG => Some('G'),
            Self::PolyC => Some('C'),
            Self::PolyA => Some('A'),
            Self::PolyU => Some('U'),
            Self::Other => None,
        }
    }

    pub fn style(self) -> AnnotationStyle {
        let (color, legend) = match self {
            Self::PolyG => ("#388e3c", "Poly-G (GGG)"),
            Self::PolyC => ("#0288d1", "Poly-C (CCC)"),
            Self::PolyA => ("#fbc02d", "Poly-A (AAA)"),
            Self::PolyU => ("#d32f2f", "Poly-U (UUU)"),
            Self::Other => (DEFAULT_BINDING_SITE_COLOR, "Unknown"),
        };
        AnnotationStyle { color, legend }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "class", rename_all = "camelCase")]
pub enum AnnotationKind {
    Motif(MotifClass),
    BindingSite(BindingSiteClass),
}

impl AnnotationKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Motif(_) => "motif",
            Self::BindingSite(_) => "bindingSite",
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            Self::Motif(class) => class.as_str(),
            Self::BindingSite(class) => class.as_str(),
        }
    }

    pub fn style(self) -> AnnotationStyle {
        match self {
            Self::Motif(class) => class.style(),
            Self::BindingSite(class) => class.style(),
        }
    }
}

/// A labeled, inclusive residue range `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationInterval {
    pub start: usize,
    pub end: usize,
    pub label: String,
    #[serde(flatten)]
    pub kind: AnnotationKind,
}

impl AnnotationInterval {
    pub fn new(start: usize, end: usize, label: &str, kind: AnnotationKind) -> Self {
        Self {
            start,
            end,
            label: label.to_string(),
            kind,
        }
    }

    pub fn span(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, i: usize) -> bool {
        self.start <= i && i <= self.end
    }

    pub fn from_motif(entity: &MotifEntity) -> Self {
        Self::new(
            entity.start,
            entity.end,
            &entity.label,
            AnnotationKind::Motif(MotifClass::parse(&entity.kind)),
        )
    }

    pub fn from_binding_site(site: &BindingSite) -> Self {
        let class = BindingSiteClass::parse(&site.label);
        let label = if site.label.trim().is_empty() {
            class.style().legend.to_string()
        } else {
            site.label.clone()
        };
        Self::new(site.start, site.end, &label, AnnotationKind::BindingSite(class))
    }
}

/// Motifs first, then binding sites, each in input order.
pub fn collect_intervals(motifs: &[MotifEntity], sites: &[BindingSite]) -> Vec<AnnotationInterval> {
    motifs
        .iter()
        .map(AnnotationInterval::from_motif)
        .chain(sites.iter().map(AnnotationInterval::from_binding_site))
        .collect()
}
