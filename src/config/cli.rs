//! CLI argument types

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Descifrar: analysis helpers for brain-to-sentence decoding experiments
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "descifrar")]
#[command(version)]
#[command(about = "Load decoding data, rank decoder predictions and compare models")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Analysis config (defaults to ./descifrar.yaml when present)
    #[arg(short, long, global = true, env = "DESCIFRAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (text, json, yaml)
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show the sentence stimuli
    Sentences(SentencesArgs),

    /// Load, project and concatenate sentence encodings
    Encodings(EncodingsArgs),

    /// Load a subject's brain images
    Brain(BrainArgs),

    /// Summarise decoder performance CSVs
    Perfs(PerfsArgs),

    /// List decoder prediction matrices
    Preds(ResultsArgs),

    /// Rank decoder predictions against sentence encodings
    Ranks(RanksArgs),

    /// Wilcoxon signed-rank comparison of models' rank predictions
    Compare(CompareArgs),

    /// Summarise a fine-tuning checkpoint and its event logs
    Checkpoint(CheckpointArgs),
}

/// Arguments for the sentences command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct SentencesArgs {
    /// Sentence file, one sentence per line
    #[arg(value_name = "FILE")]
    pub path: Option<PathBuf>,
}

/// Arguments for the encodings command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct EncodingsArgs {
    /// Encoding `.npy` files
    #[arg(value_name = "NPY")]
    pub paths: Vec<PathBuf>,

    /// Project each file to this many principal components
    #[arg(short, long)]
    pub project: Option<usize>,
}

/// Arguments for the brain command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct BrainArgs {
    /// Subject `.mat` file
    #[arg(value_name = "MAT")]
    pub path: Option<PathBuf>,

    /// Variable holding the image matrix
    #[arg(long)]
    pub field: Option<String>,

    /// Project images to this many principal components
    #[arg(short, long)]
    pub project: Option<usize>,
}

/// Arguments for the preds command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ResultsArgs {
    /// Directory of decoder outputs
    #[arg(value_name = "DIR")]
    pub results_dir: Option<PathBuf>,

    /// Only consider files starting with this prefix
    #[arg(long)]
    pub prefix: Option<String>,
}

/// Arguments for the perfs command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct PerfsArgs {
    #[command(flatten)]
    pub results: ResultsArgs,

    /// Show every row instead of per-decoder means
    #[arg(long)]
    pub all: bool,
}

/// Arguments for the ranks command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct RanksArgs {
    /// Directory of decoder `.pred.npy` outputs
    #[arg(value_name = "DIR")]
    pub results_dir: Option<PathBuf>,

    /// Encoding `.npy` files the decoders were trained against
    #[arg(short, long = "encoding", value_name = "NPY")]
    pub encodings: Vec<PathBuf>,

    /// Project each encoding file to this many principal components
    #[arg(short, long)]
    pub project: Option<usize>,

    /// Only consider files starting with this prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Rank raw predictions without centring and normalising
    #[arg(long)]
    pub no_normalize: bool,

    /// Write per-decoder rank CSVs into this directory
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
}

/// Arguments for the compare command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct CompareArgs {
    /// Model and rank CSV stem as NAME=STEM (repeatable)
    #[arg(short, long = "model", value_name = "NAME=STEM")]
    pub models: Vec<String>,

    /// Model pair to compare as A:B (repeatable; default all pairs)
    #[arg(long = "pair", value_name = "A:B")]
    pub pairs: Vec<String>,

    /// Report uncorrected p-values only
    #[arg(long)]
    pub no_bonferroni: bool,

    /// Directory of rank CSVs
    #[arg(long)]
    pub pred_dir: Option<PathBuf>,

    /// Rank CSV file-name template with one `{}` placeholder
    #[arg(long)]
    pub template: Option<String>,
}

/// Arguments for the checkpoint command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct CheckpointArgs {
    /// Fine-tuning output directory
    #[arg(value_name = "SAVEDIR")]
    pub savedir: Option<PathBuf>,

    /// Only report these steps (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub steps: Vec<i64>,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            _ => Err(format!("Unknown output format: {s}. Valid formats: text, json, yaml")),
        }
    }
}

/// Parse `NAME=STEM`.
pub fn parse_model_arg(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, stem)) if !name.is_empty() && !stem.is_empty() => {
            Ok((name.to_string(), stem.to_string()))
        }
        _ => Err(format!("Invalid model '{arg}': expected NAME=STEM")),
    }
}

/// Parse `A:B`.
pub fn parse_pair_arg(arg: &str) -> Result<(String, String), String> {
    match arg.split_once(':') {
        Some((a, b)) if !a.is_empty() && !b.is_empty() => Ok((a.to_string(), b.to_string())),
        _ => Err(format!("Invalid pair '{arg}': expected A:B")),
    }
}
