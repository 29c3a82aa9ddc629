//! YAML analysis configuration
//!
//! An [`AnalysisConfig`] collects the paths and options the CLI would
//! otherwise take as flags, so a whole analysis can be replayed from one file.

mod cli;
mod loader;
mod schema;
pub mod validate;

pub use cli::{
    parse_model_arg, parse_pair_arg, BrainArgs, CheckpointArgs, Cli, Command, CompareArgs, EncodingsArgs,
    OutputFormat, PerfsArgs, RanksArgs, ResultsArgs, SentencesArgs,
};
pub use loader::{load_config, DEFAULT_CONFIG_FILE};
pub use schema::{AnalysisConfig, BrainConfig, CheckpointConfig, ComparisonConfig};
pub use validate::{validate_config, ValidationError};
