//! Configuration file support.
//!
//! Every field has a default, so an empty JSON object `{}` is a valid
//! configuration and matches running without `--config`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnnotateError, Result};
use crate::labels::{default_labels, LabelEntry, LabelMap};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Linear blend weights for the overlay composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub source: f32,
    pub overlay: f32,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            source: 0.7,
            overlay: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Resolution every source image and mask is resized to
    pub working_size: [u32; 2],
    /// On-screen canvas size in points
    pub canvas_size: [f32; 2],
    /// Distance from the first vertex that auto-closes a polygon
    pub close_threshold: f32,
    pub blend: BlendWeights,
    /// Maximum undo snapshots kept; `None` keeps all of them
    pub history_depth: Option<usize>,
    /// Class selected at startup
    pub default_label: u8,
    pub log_level: LogLevel,
    pub labels: Vec<LabelEntry>,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            working_size: [687, 687],
            canvas_size: [800.0, 600.0],
            close_threshold: 10.0,
            blend: BlendWeights::default(),
            history_depth: None,
            default_label: 1,
            log_level: LogLevel::default(),
            labels: default_labels(),
        }
    }
}

impl AnnotatorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Check the numeric fields and build the label map, which performs the
    /// label table checks.
    pub fn validate(&self) -> Result<LabelMap> {
        let [w, h] = self.working_size;
        if w == 0 || h == 0 {
            return Err(AnnotateError::invalid_config(format!(
                "working_size must be non-zero, got {w}x{h}"
            )));
        }
        let [cw, ch] = self.canvas_size;
        if !(cw > 0.0 && ch > 0.0) {
            return Err(AnnotateError::invalid_config(format!(
                "canvas_size must be positive, got {cw}x{ch}"
            )));
        }
        if !(self.close_threshold > 0.0) {
            return Err(AnnotateError::invalid_config(
                "close_threshold must be positive",
            ));
        }
        if self.history_depth == Some(0) {
            return Err(AnnotateError::invalid_config(
                "history_depth must be at least 1 (omit it for unbounded)",
            ));
        }
        let labels = LabelMap::from_entries(&self.labels)?;
        if !labels.contains(self.default_label) {
            return Err(AnnotateError::invalid_config(format!(
                "default_label {} is not in the label map",
                self.default_label
            )));
        }
        Ok(labels)
    }
}
