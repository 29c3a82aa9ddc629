//! Error types for descifrar.
//!
//! Every loader and analysis routine returns [`Result`]. Failures from the
//! underlying format libraries are wrapped with the offending path so a bad
//! file in a results directory can be found without a debugger.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for descifrar operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading or analysing decoding data.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem error with the path being accessed.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// NumPy `.npy` file could not be decoded.
    #[error("Failed to read NPY array {path}: {message}")]
    Npy { path: PathBuf, message: String },

    /// MATLAB `.mat` file could not be decoded or holds unsupported data.
    #[error("Failed to read MAT file {path}: {message}")]
    MatFormat { path: PathBuf, message: String },

    /// Named variable is absent from a MATLAB file.
    #[error("Variable '{field}' not found in {path}")]
    MissingField { path: PathBuf, field: String },

    /// CSV file could not be decoded.
    #[error("Failed to read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Matrix dimensions disagree.
    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { context: String, expected: Vec<usize>, actual: Vec<usize> },

    /// PCA target dimension cannot be fitted.
    #[error("Invalid projection to {requested} components for a {rows}x{cols} matrix")]
    InvalidProjection { requested: usize, rows: usize, cols: usize },

    /// An operation that needs at least one input received none.
    #[error("No inputs given: {0}")]
    NoInputs(String),

    /// A glob over a results directory matched nothing.
    #[error("{0}")]
    NoResults(String),

    /// A result file name does not follow the `.<model>-run<N>-<step>-<subject>` grammar.
    #[error("Cannot parse decoder key from file name '{0}'")]
    UnparseableName(String),

    /// A model comparison refers to a model without a prediction file.
    #[error("Unknown model '{0}' in comparison pairs")]
    UnknownModel(String),

    /// Not enough usable observations for a statistic.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// TFRecord framing error.
    #[error("Malformed TFRecord in {path}: {message}")]
    TfRecord { path: PathBuf, message: String },

    /// Stored checksum does not match the payload.
    #[error("Checksum mismatch in {context}: stored {stored:#010x}, computed {computed:#010x}")]
    Checksum { context: String, stored: u32, computed: u32 },

    /// Protobuf payload could not be decoded.
    #[error("Protobuf decode error in {context}: {source}")]
    Protobuf {
        context: String,
        #[source]
        source: prost::DecodeError,
    },

    /// Tensor bundle or SSTable index is malformed or unsupported.
    #[error("Invalid checkpoint bundle {path}: {message}")]
    Bundle { path: PathBuf, message: String },

    /// Checkpoint prefix has no index file.
    #[error("Checkpoint not found: {0}")]
    CheckpointNotFound(PathBuf),

    /// Tensor is absent from a checkpoint.
    #[error("Tensor '{0}' not found in checkpoint")]
    TensorNotFound(String),

    /// Configuration file could not be read or is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Output could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Wrap an IO error with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Shorthand for a [`Error::ShapeMismatch`].
    pub fn shape(context: impl Into<String>, expected: Vec<usize>, actual: Vec<usize>) -> Self {
        Self::ShapeMismatch { context: context.into(), expected, actual }
    }

    /// Stable error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "E001",
            Self::Npy { .. } => "E010",
            Self::MatFormat { .. } => "E011",
            Self::MissingField { .. } => "E012",
            Self::Csv { .. } => "E013",
            Self::ShapeMismatch { .. } => "E020",
            Self::InvalidProjection { .. } => "E021",
            Self::NoInputs(_) => "E030",
            Self::NoResults(_) => "E031",
            Self::UnparseableName(_) => "E032",
            Self::UnknownModel(_) => "E033",
            Self::InsufficientData(_) => "E040",
            Self::TfRecord { .. } => "E050",
            Self::Checksum { .. } => "E051",
            Self::Protobuf { .. } => "E052",
            Self::Bundle { .. } => "E053",
            Self::CheckpointNotFound(_) => "E054",
            Self::TensorNotFound(_) => "E055",
            Self::ConfigError(_) => "E060",
            Self::Serialization(_) => "E061",
        }
    }

    /// Whether the error means a checkpoint or tensor simply is not there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CheckpointNotFound(_) | Self::TensorNotFound(_))
            || matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_unique() {
        let errors = vec![
            Error::io("", std::io::Error::other("x")),
            Error::Npy { path: "".into(), message: "".into() },
            Error::MatFormat { path: "".into(), message: "".into() },
            Error::MissingField { path: "".into(), field: "".into() },
            Error::shape("", vec![], vec![]),
            Error::InvalidProjection { requested: 0, rows: 0, cols: 0 },
            Error::NoInputs("".into()),
            Error::NoResults("".into()),
            Error::UnparseableName("".into()),
            Error::UnknownModel("".into()),
            Error::InsufficientData("".into()),
            Error::TfRecord { path: "".into(), message: "".into() },
            Error::Checksum { context: "".into(), stored: 0, computed: 0 },
            Error::Bundle { path: "".into(), message: "".into() },
            Error::CheckpointNotFound("".into()),
            Error::TensorNotFound("".into()),
            Error::ConfigError("".into()),
            Error::Serialization("".into()),
        ];

        let codes: Vec<_> = errors.iter().map(Error::code).collect();
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_no_results_message_is_verbatim() {
        let err = Error::NoResults("No valid csv outputs found.".into());
        assert_eq!(err.to_string(), "No valid csv outputs found.");
    }

    #[test]
    fn test_shape_mismatch_display() {
        let err = Error::shape("concatenate", vec![384], vec![200]);
        let msg = err.to_string();
        assert!(msg.contains("concatenate"));
        assert!(msg.contains("384"));
        assert!(msg.contains("200"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::CheckpointNotFound("model.ckpt".into()).is_not_found());
        assert!(Error::TensorNotFound("global_step".into()).is_not_found());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(Error::io("x", io).is_not_found());
        assert!(!Error::NoInputs("x".into()).is_not_found());
    }

    #[test]
    fn test_checksum_display_is_hex() {
        let err = Error::Checksum { context: "record".into(), stored: 0xdead_beef, computed: 1 };
        assert!(err.to_string().contains("0xdeadbeef"));
    }
}
