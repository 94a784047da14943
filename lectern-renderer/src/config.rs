//! Renderer configuration: YAML file plus environment overrides.
//!
//! ```yaml
//! grace_period_ms: 200      # null disables success inference
//! report_buffer: 32
//! boundary:
//!   title: Interactive Artifact
//!   assets:
//!     react: { url: "https://unpkg.com/react@18/umd/react.development.js" }
//!     react_dom: { file: "vendor/react-dom.js" }
//!     jsx_transform: { url: "https://unpkg.com/@babel/standalone/babel.min.js" }
//!     styling: { url: "https://cdn.tailwindcss.com" }
//! ```

use lectern_artifact::BoundaryOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::error::{RendererError, RendererResult};

/// Grace period after the frame's ready signal before success is inferred.
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 200;

pub const DEFAULT_REPORT_BUFFER: usize = 32;

/// Overrides `grace_period_ms`; `off` disables inference.
pub const GRACE_ENV_VAR: &str = "LECTERN_GRACE_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub grace_period_ms: Option<u64>,
    /// Capacity of the report channel between frame host and controller.
    pub report_buffer: usize,
    pub boundary: BoundaryOptions,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: Some(DEFAULT_GRACE_PERIOD_MS),
            report_buffer: DEFAULT_REPORT_BUFFER,
            boundary: BoundaryOptions::default(),
        }
    }
}

impl RendererConfig {
    /// Parse YAML; `file` assets are read and inlined once here.
    pub fn from_yaml_str(yaml: &str) -> RendererResult<Self> {
        let mut config: RendererConfig = serde_yaml::from_str(yaml)?;
        if config.report_buffer == 0 {
            return Err(RendererError::Config(
                "report_buffer must be at least 1".to_string(),
            ));
        }
        config.boundary.assets = config.boundary.assets.inlined()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> RendererResult<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|e| RendererError::ConfigUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Apply `LECTERN_GRACE_MS` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(GRACE_ENV_VAR) {
            Ok(value) => self.with_grace_override(&value),
            Err(_) => self,
        }
    }

    fn with_grace_override(mut self, value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("off") || value.eq_ignore_ascii_case("none") {
            self.grace_period_ms = None;
        } else {
            match value.parse::<u64>() {
                Ok(ms) => self.grace_period_ms = Some(ms),
                Err(_) => warn!(
                    value,
                    "ignoring invalid {} (expected milliseconds or 'off')", GRACE_ENV_VAR
                ),
            }
        }
        self
    }

    pub fn grace_period(&self) -> Option<Duration> {
        self.grace_period_ms.map(Duration::from_millis)
    }
}
