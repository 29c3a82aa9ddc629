//! File-name grammar for decoder outputs

use crate::{Error, Result};
use globset::GlobBuilder;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static PERF_CSV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(\w+)-run(\d+)-(\d+)-([\w\d]+)\.csv$").expect("Invalid decoder CSV regex")
});

static PRED_NPY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(\w+)-run(\d+)-(\d+)-([\w\d]+)\.pred\.npy$").expect("Invalid decoder NPY regex")
});

/// Kind of decoder output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// Per-fold performance CSV with `mse` and `r2` columns
    PerfCsv,
    /// Predicted encodings as a `.pred.npy` matrix
    PredNpy,
}

impl ResultKind {
    /// File-name suffix for this kind.
    pub fn suffix(self) -> &'static str {
        match self {
            ResultKind::PerfCsv => ".csv",
            ResultKind::PredNpy => ".pred.npy",
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            ResultKind::PerfCsv => &PERF_CSV_REGEX,
            ResultKind::PredNpy => &PRED_NPY_REGEX,
        }
    }
}

/// Identifies a decoder: target encoding model, model run, training step of
/// that run, and the subject whose images were decoded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DecoderKey {
    /// Encoding model name
    pub model: String,
    /// Run number of the encoding model
    pub run: u32,
    /// Training step of the run
    pub step: u64,
    /// Subject identifier
    pub subject: String,
}

impl DecoderKey {
    /// Create a key from its parts.
    pub fn new(model: impl Into<String>, run: u32, step: u64, subject: impl Into<String>) -> Self {
        Self { model: model.into(), run, step, subject: subject.into() }
    }

    /// Parse a key from a result file name.
    ///
    /// The leftmost `.<model>-run<run>-<step>-<subject><suffix>` match wins.
    pub fn parse(file_name: &str, kind: ResultKind) -> Result<Self> {
        let caps = kind
            .regex()
            .captures(file_name)
            .ok_or_else(|| Error::UnparseableName(file_name.to_string()))?;

        let run: u32 = caps[2].parse().map_err(|_| Error::UnparseableName(file_name.to_string()))?;
        let step: u64 = caps[3].parse().map_err(|_| Error::UnparseableName(file_name.to_string()))?;
        Ok(Self::new(&caps[1], run, step, &caps[4]))
    }

    /// File stem used when writing per-decoder outputs.
    pub fn stem(&self) -> String {
        format!("{}-run{}-{}-{}", self.model, self.run, self.step, self.subject)
    }
}

impl fmt::Display for DecoderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/run{}/{}/{}", self.model, self.run, self.step, self.subject)
    }
}

/// Files directly inside `dir` whose names match `{prefix}*{suffix}`, sorted.
///
/// A missing directory yields no matches.
pub fn glob_matches(dir: &Path, prefix: Option<&str>, suffix: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}*{suffix}", prefix.unwrap_or(""));
    let matcher = GlobBuilder::new(&pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| Error::ConfigError(format!("Invalid glob pattern '{pattern}': {e}")))?
        .compile_matcher();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(dir, e)),
    };

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if entry.file_name().to_str().is_some_and(|name| matcher.is_match(name)) {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches)
}
