//! Brain command implementation

use super::output::{emit, MatrixReport};
use super::{fail, Context};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::BrainArgs;
use crate::io::{load_brain_field, BRAIN_FIELD};

pub fn run_brain(args: BrainArgs, ctx: &Context) -> Result<(), String> {
    let configured = ctx.config.brain.as_ref();
    let path = args
        .path
        .or_else(|| configured.map(|b| b.path.clone()))
        .ok_or("No brain data file given (pass a MAT path or set `brain.path` in the config)")?;
    let field = args
        .field
        .or_else(|| configured.map(|b| b.field.clone()))
        .unwrap_or_else(|| BRAIN_FIELD.to_string());
    let projection = args.project.or_else(|| configured.and_then(|b| b.projection));

    let images = load_brain_field(&path, &field, projection).map_err(fail)?;
    let report = MatrixReport { rows: images.nrows(), cols: images.ncols(), sources: vec![path], projection };

    emit(ctx.format, &report, || {
        log(
            ctx.level,
            LogLevel::Normal,
            &format!("Brain images '{field}': {} samples x {} features", report.rows, report.cols),
        );
    })
}
