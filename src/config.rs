//! Engine parameters and their JSON loading.

use crate::{coordinates::CoordinateLayout, segmenter::SegmentOptions};
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;

pub const CONFIG_ENV: &str = "RIBOSTRUCT_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayParameters {
    /// Longest sequence the engine accepts; the core functions have no limit.
    pub max_sequence_length: usize,
    pub layout: CoordinateLayout,
    pub importance_run_merging: bool,
    pub normalize_thymine: bool,
}

impl Default for OverlayParameters {
    fn default() -> Self {
        Self {
            max_sequence_length: 10_000,
            layout: CoordinateLayout::default(),
            importance_run_merging: false,
            normalize_thymine: true,
        }
    }
}

impl OverlayParameters {
    pub fn from_json(text: &str) -> Result<Self> {
        let ret: Self = serde_json::from_str(text).context("Could not parse parameters JSON")?;
        ret.layout.validate()?;
        Ok(ret)
    }

    pub fn load_from_path(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read parameters file '{path}'"))?;
        Self::from_json(&text).with_context(|| format!("Invalid parameters file '{path}'"))
    }

    /// Explicit path, then `RIBOSTRUCT_CONFIG`, then built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let from_env = std::env::var(CONFIG_ENV).ok();
        Self::load_with(path, from_env.as_deref())
    }

    fn load_with(path: Option<&str>, from_env: Option<&str>) -> Result<Self> {
        let chosen = path.or(from_env.filter(|p| !p.trim().is_empty()));
        match chosen {
            Some(p) => {
                info!("loading parameters from '{p}'");
                Self::load_from_path(p)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn segment_options(&self) -> SegmentOptions {
        SegmentOptions {
            merge_importance_runs: self.importance_run_merging,
        }
    }
}
