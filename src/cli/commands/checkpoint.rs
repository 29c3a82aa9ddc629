//! Checkpoint command implementation

use super::output::emit;
use super::{fail, Context};
use crate::checkpoint::load_finetune_metadata;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::CheckpointArgs;

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

pub fn run_checkpoint(args: CheckpointArgs, ctx: &Context) -> Result<(), String> {
    let configured = ctx.config.checkpoint.as_ref();
    let savedir = args
        .savedir
        .or_else(|| configured.map(|c| c.savedir.clone()))
        .ok_or("No savedir given (pass SAVEDIR or set `checkpoint.savedir` in the config)")?;
    let steps = if args.steps.is_empty() {
        configured.and_then(|c| c.steps.clone())
    } else {
        Some(args.steps)
    };

    let meta = load_finetune_metadata(&savedir, steps.as_deref()).map_err(fail)?;

    emit(ctx.format, &meta, || {
        log(ctx.level, LogLevel::Normal, &format!("Checkpoint metadata for {}", savedir.display()));
        let show = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
        println!("Global steps: {}", show(meta.global_steps.map(|s| s.to_string())));
        println!("Output dims: {}", show(meta.output_dims.map(|d| d.to_string())));
        println!(
            "First train loss: {} (per dim {})",
            cell(meta.first_train_loss),
            cell(meta.first_train_loss_norm)
        );
        if meta.steps.is_empty() {
            return;
        }
        println!();
        println!(
            "{:>8} {:>12} {:>10} {:>10} {:>10} {:>10}",
            "step", "sum |grad|", "loss", "loss/dim", "eval loss", "eval acc"
        );
        for (step, m) in &meta.steps {
            println!(
                "{:>8} {:>12} {:>10} {:>10} {:>10} {:>10}",
                step,
                cell(m.total_global_norms),
                cell(m.train_loss),
                cell(m.train_loss_norm),
                cell(m.eval_loss),
                cell(m.eval_accuracy)
            );
        }
    })
}
