pub mod about;
pub mod annotation;
pub mod config;
pub mod coordinates;
pub mod engine;
pub mod error;
pub mod export;
pub mod rna_sequence;
pub mod rna_structure;
pub mod scan;
pub mod segmenter;

pub use coordinates::synthesize_coordinates;
pub use engine::{Engine, OverlayEngine, OverlayReport, OverlayRequest};
pub use error::{OverlayWarning, RiboStructError};
pub use export::{parse_connectivity, pseudo_pdb};
pub use ribostruct_protocol as protocol;
pub use rna_sequence::RnaSequence;
pub use rna_structure::{parse_structure, BasePair, BasePairTable};
pub use scan::{scan_binding_sites, scan_motifs};
pub use segmenter::segment;
