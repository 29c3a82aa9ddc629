use super::bundle::CheckpointReader;
use super::events::read_events;
use crate::results::glob_matches;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

const GLOBAL_NORM_TAG: &str = "grads/global_norm";
/// Classifier heads log `loss_1`, span-prediction heads log `loss`.
const LOSS_TAGS: [&str; 2] = ["loss_1", "loss"];
const EVAL_LOSS_TAG: &str = "eval_loss";
const EVAL_ACCURACY_TAG: &str = "eval_accuracy";

/// Metrics recorded at one training step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    /// Running sum of gradient global norms up to this step
    pub total_global_norms: Option<f64>,
    pub train_loss: Option<f64>,
    /// `train_loss / output_dims`
    pub train_loss_norm: Option<f64>,
    pub eval_accuracy: Option<f64>,
    pub eval_loss: Option<f64>,
}

/// Summary of one fine-tuning run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinetuneMetadata {
    pub global_steps: Option<i64>,
    pub output_dims: Option<usize>,
    pub steps: BTreeMap<i64, StepMetrics>,
    pub first_train_loss: Option<f64>,
    pub first_train_loss_norm: Option<f64>,
}

fn per_dim(loss: Option<f64>, output_dims: Option<usize>) -> Option<f64> {
    Some(loss? / output_dims? as f64)
}

/// `None` for "tensor absent", other errors propagate.
fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::TensorNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn open_checkpoint(savedir: &Path, checkpoint_steps: Option<&[i64]>) -> Result<CheckpointReader> {
    match CheckpointReader::open(savedir.join("model.ckpt")) {
        Err(Error::CheckpointNotFound(prefix)) => match checkpoint_steps.and_then(<[i64]>::last) {
            Some(last) => CheckpointReader::open(savedir.join(format!("model.ckpt-{last}"))),
            None => Err(Error::CheckpointNotFound(prefix)),
        },
        other => other,
    }
}

/// Load checkpoint and event-log metadata of a fine-tuned model in `savedir`.
///
/// The checkpoint is `savedir/model.ckpt`, falling back to the last of
/// `checkpoint_steps` when that is missing. Training metrics come from the
/// first `events.*` file, eval metrics from the first `eval/events.*` file;
/// either may be absent. Only events whose step is in `checkpoint_steps` are
/// recorded, or all of them without a filter.
pub fn load_finetune_metadata(
    savedir: impl AsRef<Path>,
    checkpoint_steps: Option<&[i64]>,
) -> Result<FinetuneMetadata> {
    let savedir = savedir.as_ref();
    let ckpt = open_checkpoint(savedir, checkpoint_steps)?;

    let mut meta = FinetuneMetadata::default();
    if let Some(global_steps) = optional(ckpt.read_i64_scalar("global_step"))? {
        meta.global_steps = Some(global_steps);
        meta.output_dims = optional(ckpt.shape("output_bias"))?
            .and_then(|shape| shape.first().copied())
            .and_then(|d| usize::try_from(d).ok());
    }
    info!(
        checkpoint = %ckpt.prefix().display(),
        global_steps = ?meta.global_steps,
        output_dims = ?meta.output_dims,
        "loaded checkpoint metadata"
    );

    let selected = |step: i64| checkpoint_steps.map_or(true, |steps| steps.contains(&step));

    match glob_matches(savedir, Some("events."), "")?.first() {
        None => warn!("Missing training events file in savedir: {}", savedir.display()),
        Some(events_file) => {
            let mut total_global_norm = 0.0;
            let mut first_loss = None;
            let mut cur_loss = None;
            for event in read_events(events_file)? {
                if event.summary.is_none() {
                    continue;
                }
                for value in event.values() {
                    if value.tag == GLOBAL_NORM_TAG {
                        total_global_norm += value.scalar().unwrap_or(0.0);
                    } else if LOSS_TAGS.contains(&value.tag.as_str()) {
                        if event.step == 1 {
                            first_loss = value.scalar();
                        }
                        cur_loss = value.scalar();
                    }
                }

                if selected(event.step) {
                    let metrics = meta.steps.entry(event.step).or_default();
                    metrics.total_global_norms = Some(total_global_norm);
                    metrics.train_loss = cur_loss;
                    metrics.train_loss_norm = per_dim(cur_loss, meta.output_dims);
                }
            }
            meta.first_train_loss = first_loss;
            meta.first_train_loss_norm = per_dim(first_loss, meta.output_dims);
        }
    }

    match glob_matches(&savedir.join("eval"), Some("events."), "")?.first() {
        None => warn!("Missing eval events data in savedir: {}", savedir.display()),
        Some(events_file) => {
            let mut eval_loss = None;
            let mut eval_accuracy = None;
            for event in read_events(events_file)? {
                if event.summary.is_none() {
                    continue;
                }
                for value in event.values() {
                    match value.tag.as_str() {
                        EVAL_LOSS_TAG => eval_loss = value.scalar(),
                        EVAL_ACCURACY_TAG => eval_accuracy = value.scalar(),
                        _ => {}
                    }
                }

                if selected(event.step) {
                    let metrics = meta.steps.entry(event.step).or_default();
                    metrics.eval_accuracy = eval_accuracy;
                    metrics.eval_loss = eval_loss;
                }
            }
        }
    }

    Ok(meta)
}
