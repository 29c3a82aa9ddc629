//! Perfs command implementation

use super::output::emit;
use super::{fail, Context};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{PerfsArgs, ResultsArgs};
use crate::results::load_decoding_perfs;
use std::path::PathBuf;

/// Results directory and glob prefix from flags, falling back to the config.
pub(super) fn results_location(args: ResultsArgs, ctx: &Context) -> (PathBuf, Option<String>) {
    let dir = args
        .results_dir
        .or_else(|| ctx.config.results_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let prefix = args.prefix.or_else(|| ctx.config.glob_prefix.clone());
    (dir, prefix)
}

pub fn run_perfs(args: PerfsArgs, ctx: &Context) -> Result<(), String> {
    let (dir, prefix) = results_location(args.results, ctx);
    let perfs = load_decoding_perfs(&dir, prefix.as_deref()).map_err(fail)?;

    if args.all {
        return emit(ctx.format, &perfs.rows(), || {
            log(ctx.level, LogLevel::Normal, &format!("{} rows from {}", perfs.len(), dir.display()));
            println!("{:<36} {:>12} {:>10}", "decoder", "mse", "r2");
            for row in perfs.rows() {
                println!("{:<36} {:>12.6} {:>10.4}", row.key.to_string(), row.mse, row.r2);
            }
        });
    }

    let summaries = perfs.mean_by_key();
    emit(ctx.format, &summaries, || {
        log(
            ctx.level,
            LogLevel::Normal,
            &format!("{} decoders, {} rows from {}", summaries.len(), perfs.len(), dir.display()),
        );
        println!("{:<36} {:>12} {:>10} {:>6}", "decoder", "mean mse", "mean r2", "rows");
        for summary in &summaries {
            println!(
                "{:<36} {:>12.6} {:>10.4} {:>6}",
                summary.key.to_string(),
                summary.mse,
                summary.r2,
                summary.rows
            );
        }
    })
}
