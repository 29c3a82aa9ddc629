//! Decoder prediction matrices

use super::naming::{glob_matches, DecoderKey, ResultKind};
use crate::io::load_npy_matrix;
use crate::{Error, Result};
use ndarray::Array2;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Load decoder predictions keyed by decoder.
///
/// Reads every `{glob_prefix}*.pred.npy` in `results_dir`. Fails with
/// [`Error::NoResults`] when nothing matches.
pub fn load_decoding_preds(
    results_dir: impl AsRef<Path>,
    glob_prefix: Option<&str>,
) -> Result<BTreeMap<DecoderKey, Array2<f64>>> {
    let results_dir = results_dir.as_ref();
    let mut results = BTreeMap::new();

    for path in glob_matches(results_dir, glob_prefix, ResultKind::PredNpy.suffix())? {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let key = DecoderKey::parse(name, ResultKind::PredNpy)?;
        let preds = load_npy_matrix(&path)?;
        debug!(%key, rows = preds.nrows(), cols = preds.ncols(), "loaded decoder predictions");
        results.insert(key, preds);
    }

    if results.is_empty() {
        return Err(Error::NoResults("No valid npy pred files found.".to_string()));
    }

    Ok(results)
}
