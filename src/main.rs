//! Descifrar CLI
//!
//! # Usage
//!
//! ```bash
//! # Project and concatenate encodings
//! descifrar encodings encodings/GLOVE.npy encodings/ELMO.npy --project 256
//!
//! # Rank every decoder's predictions and export rank CSVs
//! descifrar ranks perf/ -e encodings/GLOVE.npy --out-dir ranks/
//!
//! # Compare models with Bonferroni-corrected Wilcoxon tests
//! descifrar compare -m GLOVE=GLOVE-run0-250 -m ELMO=ELMO-run0-250 --pred-dir ranks/
//!
//! # Summarise a fine-tuning run
//! descifrar checkpoint models/finetune-250 --steps 5,250 --format json
//! ```

use clap::Parser;
use descifrar::cli::{init_tracing, run_command, Cli, LogLevel};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.quiet, cli.verbose));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
