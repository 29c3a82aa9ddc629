//! Cosine-similarity ranking

use super::summary::RankSummary;
use crate::{Error, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Ranks produced by [`eval_ranks`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEvaluation {
    /// `N_test x M` matrix; row `i` gives each candidate's rank for prediction `i`
    pub ranks: Array2<usize>,
    /// Rank of the true item for each prediction
    pub rank_of_correct: Array1<usize>,
}

impl RankEvaluation {
    /// Number of evaluated predictions.
    pub fn n_test(&self) -> usize {
        self.rank_of_correct.len()
    }

    /// Number of candidate items each prediction was ranked against.
    pub fn n_items(&self) -> usize {
        self.ranks.ncols()
    }

    /// Aggregate rank statistics.
    pub fn summary(&self) -> RankSummary {
        RankSummary::from_ranks(self.rank_of_correct.as_slice().unwrap_or(&[]), self.n_items())
    }
}

/// Centre predictions on their column means and scale each row to unit norm.
///
/// Rows whose centred norm is zero stay zero.
pub fn normalize_predictions(y_pred: ArrayView2<'_, f64>) -> Array2<f64> {
    let Some(mean) = y_pred.mean_axis(Axis(0)) else {
        return y_pred.to_owned();
    };
    let mut centered = &y_pred - &mean;
    for mut row in centered.rows_mut() {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row /= norm;
        }
    }
    centered
}

/// Rank every dataset item for each prediction by dot-product similarity.
///
/// * `y_pred` - `N_test x D` predicted encodings
/// * `idxs` - dataset index that generated each prediction
/// * `encodings` - `M x D` encodings of the whole dataset; a perfect decoder
///   predicts `encodings[idxs[i]]` for row `i`
/// * `encodings_normed` - when the decoder was trained on normalized
///   encodings, predictions are centred and unit-normed first so the dot
///   product is a cosine similarity
///
/// Items are ordered by descending similarity with ties kept in index order.
/// `ranks[i][j]` is item `j`'s position in that order, and
/// `rank_of_correct[i] = ranks[i][idxs[i]]`. `y_pred` is not modified.
pub fn eval_ranks(
    y_pred: ArrayView2<'_, f64>,
    idxs: &[usize],
    encodings: ArrayView2<'_, f64>,
    encodings_normed: bool,
) -> Result<RankEvaluation> {
    let n_test = y_pred.nrows();
    let n_items = encodings.nrows();

    if n_test != idxs.len() {
        return Err(Error::shape("eval_ranks predictions vs idxs", vec![idxs.len()], vec![n_test]));
    }
    if y_pred.ncols() != encodings.ncols() {
        return Err(Error::shape(
            "eval_ranks prediction width",
            vec![encodings.ncols()],
            vec![y_pred.ncols()],
        ));
    }
    if let Some(&bad) = idxs.iter().find(|&&i| i >= n_items) {
        return Err(Error::shape("eval_ranks index out of range", vec![n_items], vec![bad]));
    }

    let similarities = if encodings_normed {
        normalize_predictions(y_pred).dot(&encodings.t())
    } else {
        y_pred.dot(&encodings.t())
    };

    let mut ranks = Array2::zeros((n_test, n_items));
    let mut order: Vec<usize> = Vec::with_capacity(n_items);
    for (i, sims) in similarities.rows().into_iter().enumerate() {
        order.clear();
        order.extend(0..n_items);
        // NaN similarities sort last
        let key = |j: usize| if sims[j].is_nan() { f64::NEG_INFINITY } else { sims[j] };
        order.sort_by(|&a, &b| key(b).total_cmp(&key(a)));

        for (rank, &item) in order.iter().enumerate() {
            ranks[[i, item]] = rank;
        }
    }

    let rank_of_correct = idxs.iter().enumerate().map(|(i, &idx)| ranks[[i, idx]]).collect();

    Ok(RankEvaluation { ranks, rank_of_correct })
}
