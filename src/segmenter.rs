//! Merges annotation intervals and the per-residue importance signal into an
//! ordered, gap-free partition of `[0, length - 1]`.
//!
//! Discrete intervals win over importance. Among intervals covering the same
//! residue the earliest start wins, then the longest span, then the first one
//! in the input list.

use crate::{
    annotation::{AnnotationInterval, AnnotationKind, AnnotationStyle},
    error::OverlayWarning,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("interval #{index} [{start}, {end}] lies outside a sequence of length {length}")]
    IntervalOutOfRange {
        index: usize,
        start: usize,
        end: usize,
        length: usize,
    },
    #[error("interval #{index} starts at {start} after its end {end}")]
    InvertedInterval {
        index: usize,
        start: usize,
        end: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderKind {
    Motif,
    BindingSite,
    Importance,
}

impl RenderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Motif => "motif",
            Self::BindingSite => "bindingSite",
            Self::Importance => "importance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SegmentPayload {
    Annotation {
        /// Position of the winning interval in the caller's list.
        source_index: usize,
        label: String,
        #[serde(flatten)]
        kind: AnnotationKind,
    },
    Importance {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "renderKind")]
    render_kind: RenderKind,
    pub payload: SegmentPayload,
}

impl Segment {
    pub fn new(start: usize, end: usize, payload: SegmentPayload) -> Self {
        let render_kind = match &payload {
            SegmentPayload::Annotation {
                kind: AnnotationKind::Motif(_),
                ..
            } => RenderKind::Motif,
            SegmentPayload::Annotation {
                kind: AnnotationKind::BindingSite(_),
                ..
            } => RenderKind::BindingSite,
            SegmentPayload::Importance { .. } => RenderKind::Importance,
        };
        Self {
            start,
            end,
            render_kind,
            payload,
        }
    }

    pub fn residue_count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn render_kind(&self) -> RenderKind {
        self.render_kind
    }

    pub fn style(&self) -> Option<AnnotationStyle> {
        match &self.payload {
            SegmentPayload::Annotation { kind, .. } => Some(kind.style()),
            SegmentPayload::Importance { .. } => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match &self.payload {
            SegmentPayload::Annotation { label, .. } => Some(label),
            SegmentPayload::Importance { .. } => None,
        }
    }

    /// Highlight intensity: full for annotations, the importance value otherwise.
    pub fn intensity(&self) -> f64 {
        match &self.payload {
            SegmentPayload::Annotation { .. } => 1.0,
            SegmentPayload::Importance { value } => *value,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentOptions {
    /// Merge neighbouring importance-only residues with identical values.
    pub merge_importance_runs: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    pub segments: Vec<Segment>,
    pub warnings: Vec<OverlayWarning>,
}

impl Segmentation {
    /// One intensity per residue, in residue order.
    pub fn residue_intensities(&self) -> Vec<f64> {
        self.segments
            .iter()
            .flat_map(|s| std::iter::repeat_n(s.intensity(), s.residue_count()))
            .collect()
    }
}

fn validate(length: usize, intervals: &[AnnotationInterval]) -> Result<(), SegmentError> {
    for (index, interval) in intervals.iter().enumerate() {
        if interval.start > interval.end {
            return Err(SegmentError::InvertedInterval {
                index,
                start: interval.start,
                end: interval.end,
            });
        }
        if interval.end >= length {
            return Err(SegmentError::IntervalOutOfRange {
                index,
                start: interval.start,
                end: interval.end,
                length,
            });
        }
    }
    Ok(())
}

fn importance_at(
    importance: Option<&[f64]>,
    i: usize,
    warnings: &mut Vec<OverlayWarning>,
) -> f64 {
    let Some(value) = importance.and_then(|v| v.get(i)).copied() else {
        return 0.0;
    };
    if (0.0..=1.0).contains(&value) {
        return value;
    }
    warn!("importance value {value} at index {i} clamped into [0, 1]");
    warnings.push(OverlayWarning::ImportanceClamped { index: i, value });
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Full segmentation with warnings.
pub fn segment_with(
    length: usize,
    intervals: &[AnnotationInterval],
    importance: Option<&[f64]>,
    options: SegmentOptions,
) -> Result<Segmentation, SegmentError> {
    validate(length, intervals)?;
    let mut warnings = vec![];
    if length == 0 {
        warn!("segmenting an empty sequence");
        warnings.push(OverlayWarning::EmptyInput);
        return Ok(Segmentation {
            segments: vec![],
            warnings,
        });
    }
    if let Some(values) = importance {
        if values.len() < length {
            warn!(
                "importance vector has {} values for {} residues",
                values.len(),
                length
            );
            warnings.push(OverlayWarning::ImportanceShorter {
                expected: length,
                found: values.len(),
            });
        }
    }

    let mut order: Vec<usize> = (0..intervals.len()).collect();
    order.sort_by_key(|&idx| {
        let interval = &intervals[idx];
        (interval.start, Reverse(interval.span()), idx)
    });

    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut pos = 0;
    while pos < length {
        // Intervals ending before `pos` can never win again.
        while cursor < order.len() && intervals[order[cursor]].end < pos {
            cursor += 1;
        }
        let pending = &order[cursor..];
        let winner = pending
            .iter()
            .copied()
            .take_while(|&idx| intervals[idx].start <= pos)
            .find(|&idx| intervals[idx].end >= pos);

        if let Some(idx) = winner {
            let interval = &intervals[idx];
            segments.push(Segment::new(
                pos,
                interval.end,
                SegmentPayload::Annotation {
                    source_index: idx,
                    label: interval.label.clone(),
                    kind: interval.kind,
                },
            ));
            pos = interval.end + 1;
            continue;
        }

        // Uncovered run up to the next interval start.
        let run_end = pending
            .iter()
            .map(|&idx| intervals[idx].start)
            .find(|&start| start > pos)
            .map(|start| start - 1)
            .unwrap_or(length - 1);
        let value = importance_at(importance, pos, &mut warnings);
        let mut end = pos;
        if options.merge_importance_runs {
            while end < run_end {
                let mut scratch = vec![];
                let next = importance_at(importance, end + 1, &mut scratch);
                if next.to_bits() != value.to_bits() {
                    break;
                }
                warnings.append(&mut scratch);
                end += 1;
            }
        }
        segments.push(Segment::new(
            pos,
            end,
            SegmentPayload::Importance { value },
        ));
        pos = end + 1;
    }

    debug!(
        "segmented {} residues with {} intervals into {} segments",
        length,
        intervals.len(),
        segments.len()
    );
    Ok(Segmentation { segments, warnings })
}

/// Ordered, gap-free segments covering `[0, length - 1]`; empty for `length == 0`.
pub fn segment(
    length: usize,
    intervals: &[AnnotationInterval],
    importance: Option<&[f64]>,
) -> Result<Vec<Segment>, SegmentError> {
    Ok(segment_with(length, intervals, importance, SegmentOptions::default())?.segments)
}
