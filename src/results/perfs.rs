//! Decoding performance tables

use super::naming::{glob_matches, DecoderKey, ResultKind};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Columns read from each performance CSV; others are ignored.
#[derive(Debug, Deserialize)]
struct PerfRecord {
    #[serde(deserialize_with = "csv::invalid_option")]
    mse: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    r2: Option<f64>,
}

/// One CSV row of decoder performance (typically one cross-validation fold)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfRow {
    /// Decoder the row belongs to
    pub key: DecoderKey,
    /// Mean squared error; NaN when the cell was empty
    pub mse: f64,
    /// Coefficient of determination; NaN when the cell was empty
    pub r2: f64,
}

/// Per-decoder averages over its rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfSummary {
    /// Decoder key
    pub key: DecoderKey,
    /// Mean MSE over rows
    pub mse: f64,
    /// Mean R² over rows
    pub r2: f64,
    /// Number of rows averaged
    pub rows: usize,
}

/// Decoding performance across models, runs, steps and subjects.
///
/// Rows are ordered by key; rows of the same file keep their file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodingPerfs {
    rows: Vec<PerfRow>,
}

impl DecodingPerfs {
    /// Build from rows, sorting by key.
    pub fn from_rows(mut rows: Vec<PerfRow>) -> Self {
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        Self { rows }
    }

    /// All rows.
    pub fn rows(&self) -> &[PerfRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct decoder keys in order.
    pub fn keys(&self) -> Vec<&DecoderKey> {
        let mut keys: Vec<&DecoderKey> = self.rows.iter().map(|r| &r.key).collect();
        keys.dedup();
        keys
    }

    /// Rows for one decoder.
    pub fn for_key<'a>(&'a self, key: &'a DecoderKey) -> impl Iterator<Item = &'a PerfRow> + 'a {
        self.rows.iter().filter(move |r| &r.key == key)
    }

    /// Mean MSE and R² per decoder.
    pub fn mean_by_key(&self) -> Vec<PerfSummary> {
        let mut groups: BTreeMap<&DecoderKey, (f64, f64, usize)> = BTreeMap::new();
        for row in &self.rows {
            let entry = groups.entry(&row.key).or_insert((0.0, 0.0, 0));
            entry.0 += row.mse;
            entry.1 += row.r2;
            entry.2 += 1;
        }

        groups
            .into_iter()
            .map(|(key, (mse, r2, n))| PerfSummary {
                key: key.clone(),
                mse: mse / n as f64,
                r2: r2 / n as f64,
                rows: n,
            })
            .collect()
    }
}

/// Load decoder performance CSVs from `results_dir`.
///
/// Every file matching `{glob_prefix}*.csv` must carry a decoder key in its
/// name and `mse`/`r2` columns. Fails with [`Error::NoResults`] when nothing
/// matches.
pub fn load_decoding_perfs(
    results_dir: impl AsRef<Path>,
    glob_prefix: Option<&str>,
) -> Result<DecodingPerfs> {
    let results_dir = results_dir.as_ref();
    let mut rows = Vec::new();
    let mut files = 0usize;

    for path in glob_matches(results_dir, glob_prefix, ResultKind::PerfCsv.suffix())? {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let key = DecoderKey::parse(name, ResultKind::PerfCsv)?;

        let mut reader = csv::Reader::from_path(&path)
            .map_err(|source| Error::Csv { path: path.clone(), source })?;
        let before = rows.len();
        for record in reader.deserialize::<PerfRecord>() {
            let record = record.map_err(|source| Error::Csv { path: path.clone(), source })?;
            rows.push(PerfRow {
                key: key.clone(),
                mse: record.mse.unwrap_or(f64::NAN),
                r2: record.r2.unwrap_or(f64::NAN),
            });
        }
        debug!(path = %path.display(), %key, rows = rows.len() - before, "loaded decoder performance");
        files += 1;
    }

    if files == 0 {
        return Err(Error::NoResults("No valid csv outputs found.".to_string()));
    }

    Ok(DecodingPerfs::from_rows(rows))
}
