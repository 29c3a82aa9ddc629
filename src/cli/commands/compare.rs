//! Compare command implementation

use super::output::emit;
use super::{fail, Context};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{parse_model_arg, parse_pair_arg, CompareArgs};
use crate::stats::wilcoxon_rank_preds;
use std::collections::BTreeMap;

pub fn run_compare(args: CompareArgs, ctx: &Context) -> Result<(), String> {
    let configured = ctx.config.comparison.as_ref();

    let models: BTreeMap<String, String> = if args.models.is_empty() {
        configured.map(|c| c.models.clone()).unwrap_or_default()
    } else {
        args.models.iter().map(|m| parse_model_arg(m)).collect::<Result<_, _>>()?
    };
    if models.len() < 2 {
        return Err(format!("Need at least two models to compare, got {}", models.len()));
    }

    let pairs: Option<Vec<(String, String)>> = if args.pairs.is_empty() {
        configured.and_then(|c| c.pairs.clone())
    } else {
        Some(args.pairs.iter().map(|p| parse_pair_arg(p)).collect::<Result<_, _>>()?)
    };

    let bonferroni = !args.no_bonferroni && configured.map_or(true, |c| c.bonferroni);
    let mut source = configured.map(|c| c.pred_source()).unwrap_or_default();
    if let Some(dir) = args.pred_dir {
        source.dir = dir;
    }
    if let Some(template) = args.template {
        source = source.with_template(template);
    }
    if !source.template.contains("{}") {
        return Err(format!("Template '{}' has no '{{}}' placeholder", source.template));
    }

    let table = wilcoxon_rank_preds(&models, bonferroni, pairs.as_deref(), &source).map_err(fail)?;

    emit(ctx.format, &table, || {
        log(
            ctx.level,
            LogLevel::Normal,
            &format!("{} comparisons across {} models", table.len(), models.len()),
        );
        if let Some(correction) = table.correction {
            log(
                ctx.level,
                LogLevel::Normal,
                &format!("Bonferroni correction {correction}: alpha 0.01 -> {:.2e}", 0.01 / correction as f64),
            );
        }
        print!("{table}");
    })
}
