//! Sentence stimulus loading

use crate::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Stimulus file used by the 384-sentence experiments.
pub const DEFAULT_SENTENCES_PATH: &str = "data/sentences/stimuli_384sentences.txt";

/// Load sentence stimuli, one per line, with surrounding whitespace stripped.
///
/// Blank lines inside the file are kept as empty strings so that line numbers
/// stay aligned with encoding rows.
pub fn load_sentences(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;

    BufReader::new(file)
        .lines()
        .map(|line| line.map(|l| l.trim().to_string()).map_err(|e| Error::io(path, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_sentences_strips_whitespace() {
        let mut file = NamedTempFile::new().expect("temp file creation should succeed");
        write!(file, "  The dog barked.\nA bird sang.\t\r\n\nRain fell.\n")
            .expect("file write should succeed");

        let sentences = load_sentences(file.path()).expect("load should succeed");
        assert_eq!(sentences, vec!["The dog barked.", "A bird sang.", "", "Rain fell."]);
    }

    #[test]
    fn test_load_sentences_no_trailing_newline() {
        let mut file = NamedTempFile::new().expect("temp file creation should succeed");
        write!(file, "one\ntwo").expect("file write should succeed");

        let sentences = load_sentences(file.path()).expect("load should succeed");
        assert_eq!(sentences.len(), 2);
    }

    #[test]
    fn test_load_sentences_missing_file() {
        let err = load_sentences("no/such/stimuli.txt").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("stimuli.txt"));
    }
}
