//! Encodings command implementation

use super::output::{emit, MatrixReport};
use super::{fail, Context};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::EncodingsArgs;
use crate::io::load_encodings;

pub fn run_encodings(args: EncodingsArgs, ctx: &Context) -> Result<(), String> {
    let paths = if args.paths.is_empty() {
        ctx.config.encodings.clone().unwrap_or_default()
    } else {
        args.paths
    };
    if paths.is_empty() {
        return Err("No encoding files given (pass NPY paths or set `encodings` in the config)".into());
    }
    let projection = args.project.or(ctx.config.projection);

    let encodings = load_encodings(&paths, projection).map_err(fail)?;
    let report = MatrixReport { rows: encodings.nrows(), cols: encodings.ncols(), sources: paths, projection };

    emit(ctx.format, &report, || {
        log(ctx.level, LogLevel::Normal, &format!("Encodings: {} x {}", report.rows, report.cols));
        for source in &report.sources {
            log(ctx.level, LogLevel::Verbose, &format!("  {}", source.display()));
        }
    })
}
