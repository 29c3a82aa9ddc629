//! CLI command implementations

mod brain;
mod checkpoint;
mod compare;
mod encodings;
mod output;
mod perfs;
mod preds;
mod ranks;
mod sentences;


use crate::cli::LogLevel;
use crate::config::{load_config, AnalysisConfig, Cli, Command, OutputFormat, DEFAULT_CONFIG_FILE};
use std::path::Path;

/// Settings shared by every command
pub struct Context {
    pub config: AnalysisConfig,
    pub level: LogLevel,
    pub format: OutputFormat,
}

/// Render a library error for the terminal.
pub fn fail(e: crate::Error) -> String {
    format!("{e} [{}]", e.code())
}

/// Explicit `--config`, else `./descifrar.yaml` when present, else defaults.
fn resolve_config(path: Option<&Path>) -> Result<AnalysisConfig, String> {
    match path {
        Some(path) => load_config(path).map_err(|e| format!("Config error: {e}")),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            load_config(DEFAULT_CONFIG_FILE).map_err(|e| format!("Config error: {e}"))
        }
        None => Ok(AnalysisConfig::default()),
    }
}

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let ctx = Context {
        config: resolve_config(cli.config.as_deref())?,
        level: LogLevel::from_flags(cli.quiet, cli.verbose),
        format: cli.format,
    };

    match cli.command {
        Command::Sentences(args) => sentences::run_sentences(args, &ctx),
        Command::Encodings(args) => encodings::run_encodings(args, &ctx),
        Command::Brain(args) => brain::run_brain(args, &ctx),
        Command::Perfs(args) => perfs::run_perfs(args, &ctx),
        Command::Preds(args) => preds::run_preds(args, &ctx),
        Command::Ranks(args) => ranks::run_ranks(args, &ctx),
        Command::Compare(args) => compare::run_compare(args, &ctx),
        Command::Checkpoint(args) => checkpoint::run_checkpoint(args, &ctx),
    }
}
