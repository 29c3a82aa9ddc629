//! Rank evaluation of decoder predictions
//!
//! A decoder maps brain images to predicted sentence encodings. Each
//! prediction is scored against every sentence encoding in the dataset by
//! similarity; the rank of the true sentence among all candidates measures
//! how well the decoder singled it out (0 is best).
//!
//! - `ranks`: double-argsort rank matrix and rank-of-correct vector
//! - `summary`: mean/median rank, MRR and top-k accuracy
//! - `export`: per-item rank CSVs consumed by `stats::compare`

mod export;
mod ranks;
mod summary;


pub use export::{rank_records, write_rank_csv, RankRecord};
pub use ranks::{eval_ranks, normalize_predictions, RankEvaluation};
pub use summary::RankSummary;
