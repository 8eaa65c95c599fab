//! Output configuration.

use serde::{Deserialize, Serialize};

use crate::infrastructure::output::DEFAULT_OUTPUT_PATH;

/// Where results are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON file receiving the harvested records.
    #[serde(default = "default_path")]
    pub path: String,
    /// Optional JSON file receiving the run report.
    #[serde(default)]
    pub report_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            report_path: None,
        }
    }
}

fn default_path() -> String {
    DEFAULT_OUTPUT_PATH.to_string()
}
