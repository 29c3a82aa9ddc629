//! Structured output helpers

use crate::config::OutputFormat;
use serde::Serialize;
use std::path::PathBuf;

/// Shape of a loaded matrix and where it came from
#[derive(Debug, Serialize)]
pub struct MatrixReport {
    pub sources: Vec<PathBuf>,
    pub rows: usize,
    pub cols: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<usize>,
}

/// Print `value` as JSON/YAML, or run `text` for the human-readable form.
pub fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce()) -> Result<(), String> {
    match format {
        OutputFormat::Text => text(),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(value)
                .map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }
    Ok(())
}
