//! Per-item rank CSV output

use super::ranks::RankEvaluation;
use crate::results::DecoderKey;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One prediction's rank-of-correct, tagged with its decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRecord {
    pub model: String,
    pub run: u32,
    pub step: u64,
    pub subject: String,
    /// Dataset index of the true item
    pub idx: usize,
    /// Rank of the true item (0 is best)
    pub rank: usize,
}

/// Flatten a rank evaluation into records.
pub fn rank_records(key: &DecoderKey, eval: &RankEvaluation, idxs: &[usize]) -> Result<Vec<RankRecord>> {
    if idxs.len() != eval.n_test() {
        return Err(Error::shape("rank records idxs", vec![eval.n_test()], vec![idxs.len()]));
    }

    Ok(idxs
        .iter()
        .zip(eval.rank_of_correct.iter())
        .map(|(&idx, &rank)| RankRecord {
            model: key.model.clone(),
            run: key.run,
            step: key.step,
            subject: key.subject.clone(),
            idx,
            rank,
        })
        .collect())
}

/// Write rank records as CSV with a header row.
pub fn write_rank_csv(path: impl AsRef<Path>, records: &[RankRecord]) -> Result<()> {
    let path = path.as_ref();
    let mut writer =
        csv::Writer::from_path(path).map_err(|source| Error::Csv { path: path.to_path_buf(), source })?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|source| Error::Csv { path: path.to_path_buf(), source })?;
    }
    writer.flush().map_err(|e| Error::io(path, e))
}
