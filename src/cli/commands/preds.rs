//! Preds command implementation

use super::output::emit;
use super::perfs::results_location;
use super::{fail, Context};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::ResultsArgs;
use crate::results::{load_decoding_preds, DecoderKey};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PredInfo {
    key: DecoderKey,
    rows: usize,
    cols: usize,
}

pub fn run_preds(args: ResultsArgs, ctx: &Context) -> Result<(), String> {
    let (dir, prefix) = results_location(args, ctx);
    let preds = load_decoding_preds(&dir, prefix.as_deref()).map_err(fail)?;

    let infos: Vec<PredInfo> = preds
        .iter()
        .map(|(key, matrix)| PredInfo { key: key.clone(), rows: matrix.nrows(), cols: matrix.ncols() })
        .collect();

    emit(ctx.format, &infos, || {
        log(ctx.level, LogLevel::Normal, &format!("{} prediction matrices in {}", infos.len(), dir.display()));
        for info in &infos {
            println!("{:<36} {:>6} x {:<6}", info.key.to_string(), info.rows, info.cols);
        }
    })
}
