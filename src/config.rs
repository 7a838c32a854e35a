//! Editor configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::edit::locate::AmbiguityPolicy;
use crate::foundation::error::{PagError, PagResult};

/// Settings shared by every subcommand; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Extra directory searched for relative image paths.
    pub images_dir: Option<PathBuf>,

    /// File name prefix for rendered frames.
    pub frame_prefix: String,

    /// Render frame rate; the document's own rate when unset.
    pub fps: Option<f64>,

    /// Policy for editable indices bound to several layers.
    pub ambiguity: AmbiguityPolicy,

    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info", "pagsmith=debug").
    pub level: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            images_dir: None,
            frame_prefix: "frame".to_string(),
            fps: None,
            ambiguity: AmbiguityPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl EditorConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> PagResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            PagError::validation(format!("read config '{}': {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| PagError::serde(format!("parse config '{}': {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PagResult<()> {
        if let Some(fps) = self.fps
            && (!fps.is_finite() || fps <= 0.0)
        {
            return Err(PagError::validation("config fps must be finite and > 0"));
        }
        if self.frame_prefix.is_empty() || self.frame_prefix.contains(['/', '\\']) {
            return Err(PagError::validation(
                "config frame_prefix must be a non-empty file name prefix",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
