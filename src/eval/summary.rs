//! Summary statistics over rank-of-correct values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate retrieval quality of a decoder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankSummary {
    /// Number of predictions
    pub n_test: usize,
    /// Number of candidates per prediction
    pub n_items: usize,
    /// Mean rank of the correct item (0 is best)
    pub mean_rank: f64,
    /// Median rank of the correct item
    pub median_rank: f64,
    /// Mean rank scaled to [0, 1] by `n_items - 1`; 0.5 is chance
    pub normalized_mean_rank: f64,
    /// Mean of `1 / (rank + 1)`
    pub mean_reciprocal_rank: f64,
    /// Fraction ranked first
    pub top1: f64,
    /// Fraction ranked in the top 5
    pub top5: f64,
    /// Fraction ranked in the top 10
    pub top10: f64,
}

impl RankSummary {
    /// Summarize ranks of correct items among `n_items` candidates.
    ///
    /// All statistics are 0.0 when `ranks` is empty.
    pub fn from_ranks(ranks: &[usize], n_items: usize) -> Self {
        if ranks.is_empty() {
            return Self {
                n_test: 0,
                n_items,
                mean_rank: 0.0,
                median_rank: 0.0,
                normalized_mean_rank: 0.0,
                mean_reciprocal_rank: 0.0,
                top1: 0.0,
                top5: 0.0,
                top10: 0.0,
            };
        }

        let n = ranks.len() as f64;
        let mean_rank = ranks.iter().sum::<usize>() as f64 / n;

        let mut sorted = ranks.to_vec();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        let median_rank = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
        } else {
            sorted[mid] as f64
        };

        let top_k = |k: usize| ranks.iter().filter(|&&r| r < k).count() as f64 / n;

        Self {
            n_test: ranks.len(),
            n_items,
            mean_rank,
            median_rank,
            normalized_mean_rank: if n_items > 1 { mean_rank / (n_items - 1) as f64 } else { 0.0 },
            mean_reciprocal_rank: ranks.iter().map(|&r| 1.0 / (r + 1) as f64).sum::<f64>() / n,
            top1: top_k(1),
            top5: top_k(5),
            top10: top_k(10),
        }
    }
}

impl fmt::Display for RankSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean_rank={:.2}, median_rank={:.1}, norm={:.4}, mrr={:.4}, top1={:.3}, top5={:.3}, top10={:.3} (n={}, items={})",
            self.mean_rank,
            self.median_rank,
            self.normalized_mean_rank,
            self.mean_reciprocal_rank,
            self.top1,
            self.top5,
            self.top10,
            self.n_test,
            self.n_items
        )
    }
}
