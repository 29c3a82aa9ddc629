//! Significance testing across decoders
//!
//! - `wilcoxon`: paired Wilcoxon signed-rank test
//! - `compare`: per-subject pairwise model comparison with Bonferroni correction

mod compare;
mod wilcoxon;

pub use compare::{
    bonferroni, wilcoxon_rank_preds, ComparisonRow, ComparisonTable, PredSource,
    DEFAULT_PRED_TEMPLATE,
};
pub use wilcoxon::{wilcoxon, WilcoxonMethod, WilcoxonResult};
