//! Decoder result aggregation
//!
//! Decoder runs write one file per (model, run, step, subject), with the key
//! encoded in the file name, e.g. `perf.384sentences.GLOVE-run2-250-M02.csv`.
//! These loaders glob a results directory, parse each key and gather the
//! contents into one keyed collection.

mod naming;
mod perfs;
mod preds;

pub use naming::{glob_matches, DecoderKey, ResultKind};
pub use perfs::{load_decoding_perfs, DecodingPerfs, PerfRow, PerfSummary};
pub use preds::load_decoding_preds;
