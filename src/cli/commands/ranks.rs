//! Ranks command implementation

use super::output::emit;
use super::perfs::results_location;
use super::{fail, Context};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{RanksArgs, ResultsArgs};
use crate::eval::{eval_ranks, rank_records, write_rank_csv, RankRecord, RankSummary};
use crate::io::load_encodings;
use crate::results::{load_decoding_preds, DecoderKey};
use crate::stats::PredSource;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct DecoderRanks {
    key: DecoderKey,
    #[serde(flatten)]
    summary: RankSummary,
}

/// Write one rank CSV per (model, run, step), pooling subjects.
fn write_grouped(out_dir: &Path, records: Vec<RankRecord>) -> Result<Vec<PathBuf>, String> {
    std::fs::create_dir_all(out_dir).map_err(|e| format!("Failed to create {}: {e}", out_dir.display()))?;

    let mut groups: BTreeMap<(String, u32, u64), Vec<RankRecord>> = BTreeMap::new();
    for record in records {
        groups.entry((record.model.clone(), record.run, record.step)).or_default().push(record);
    }

    let source = PredSource::new(out_dir);
    let mut written = Vec::with_capacity(groups.len());
    for ((model, run, step), group) in groups {
        let path = source.path_for(&format!("{model}-run{run}-{step}"));
        write_rank_csv(&path, &group).map_err(fail)?;
        written.push(path);
    }
    Ok(written)
}

pub fn run_ranks(args: RanksArgs, ctx: &Context) -> Result<(), String> {
    let encoding_paths = if args.encodings.is_empty() {
        ctx.config.encodings.clone().unwrap_or_default()
    } else {
        args.encodings
    };
    if encoding_paths.is_empty() {
        return Err("No encoding files given (pass --encoding or set `encodings` in the config)".into());
    }
    let projection = args.project.or(ctx.config.projection);
    let normed = !args.no_normalize && ctx.config.normalize_predictions;

    let encodings = load_encodings(&encoding_paths, projection).map_err(fail)?;
    let (dir, prefix) =
        results_location(ResultsArgs { results_dir: args.results_dir, prefix: args.prefix }, ctx);
    let preds = load_decoding_preds(&dir, prefix.as_deref()).map_err(fail)?;

    let mut decoders = Vec::with_capacity(preds.len());
    let mut records = Vec::new();
    for (key, y_pred) in &preds {
        let idxs: Vec<usize> = (0..y_pred.nrows()).collect();
        let evaluation = eval_ranks(y_pred.view(), &idxs, encodings.view(), normed).map_err(fail)?;
        if args.out_dir.is_some() {
            records.extend(rank_records(key, &evaluation, &idxs).map_err(fail)?);
        }
        decoders.push(DecoderRanks { key: key.clone(), summary: evaluation.summary() });
    }

    let written = match &args.out_dir {
        Some(out_dir) => write_grouped(out_dir, records)?,
        None => Vec::new(),
    };

    emit(ctx.format, &decoders, || {
        log(
            ctx.level,
            LogLevel::Normal,
            &format!(
                "{} decoders ranked against {} x {} encodings{}",
                decoders.len(),
                encodings.nrows(),
                encodings.ncols(),
                if normed { " (normalized)" } else { "" }
            ),
        );
        println!(
            "{:<36} {:>6} {:>10} {:>8} {:>8} {:>7} {:>7} {:>7}",
            "decoder", "n", "mean rank", "median", "mrr", "top1", "top5", "top10"
        );
        for d in &decoders {
            let s = &d.summary;
            println!(
                "{:<36} {:>6} {:>10.2} {:>8.1} {:>8.4} {:>7.3} {:>7.3} {:>7.3}",
                d.key.to_string(),
                s.n_test,
                s.mean_rank,
                s.median_rank,
                s.mean_reciprocal_rank,
                s.top1,
                s.top5,
                s.top10
            );
        }
        for path in &written {
            log(ctx.level, LogLevel::Verbose, &format!("wrote {}", path.display()));
        }
        if !written.is_empty() {
            log(ctx.level, LogLevel::Normal, &format!("Wrote {} rank files", written.len()));
        }
    })
}
