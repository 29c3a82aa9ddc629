//! Unit tests for configuration validation

use super::error::ValidationError;
use super::validator::validate_config;
use crate::config::schema::*;
use std::collections::BTreeMap;
use std::path::PathBuf;

fn create_valid_config() -> AnalysisConfig {
    let models: BTreeMap<String, String> = [("GLOVE", "GLOVE-run0-250"), ("ELMO", "ELMO-run0-250")]
        .into_iter()
        .map(|(m, s)| (m.to_string(), s.to_string()))
        .collect();

    AnalysisConfig {
        encodings: Some(vec![PathBuf::from("encodings/GLOVE.npy")]),
        projection: Some(256),
        brain: Some(BrainConfig {
            path: PathBuf::from("examples_384sentences.mat"),
            field: "examples".to_string(),
            projection: None,
        }),
        comparison: Some(ComparisonConfig {
            models,
            pairs: None,
            bonferroni: true,
            pred_dir: PathBuf::from("."),
            template: "perf.384sentences.{}.pred.csv".to_string(),
        }),
        checkpoint: Some(CheckpointConfig { savedir: PathBuf::from("models/ft"), steps: Some(vec![250]) }),
        ..Default::default()
    }
}

#[test]
fn test_valid_config() {
    assert!(validate_config(&create_valid_config()).is_ok());
    assert!(validate_config(&AnalysisConfig::default()).is_ok());
}

#[test]
fn test_zero_projection() {
    let mut config = create_valid_config();
    config.projection = Some(0);
    assert!(matches!(validate_config(&config).unwrap_err(), ValidationError::InvalidProjection(0)));

    let mut config = create_valid_config();
    if let Some(brain) = config.brain.as_mut() {
        brain.projection = Some(0);
    }
    assert!(matches!(validate_config(&config).unwrap_err(), ValidationError::InvalidProjection(0)));
}

#[test]
fn test_empty_encodings() {
    let mut config = create_valid_config();
    config.encodings = Some(Vec::new());
    assert!(matches!(validate_config(&config).unwrap_err(), ValidationError::EmptyEncodings));
}

#[test]
fn test_empty_brain_field() {
    let mut config = create_valid_config();
    if let Some(brain) = config.brain.as_mut() {
        brain.field.clear();
    }
    assert!(matches!(validate_config(&config).unwrap_err(), ValidationError::EmptyBrainField));
}

#[test]
fn test_too_few_models() {
    let mut config = create_valid_config();
    if let Some(comparison) = config.comparison.as_mut() {
        comparison.models.remove("ELMO");
    }
    assert!(matches!(validate_config(&config).unwrap_err(), ValidationError::TooFewModels(1)));
}

#[test]
fn test_unknown_pair_model() {
    let mut config = create_valid_config();
    if let Some(comparison) = config.comparison.as_mut() {
        comparison.pairs = Some(vec![("GLOVE".into(), "BERT".into())]);
    }
    let err = validate_config(&config).unwrap_err();
    assert!(matches!(err, ValidationError::UnknownPairModel(ref m) if m == "BERT"));
}

#[test]
fn test_self_comparison() {
    let mut config = create_valid_config();
    if let Some(comparison) = config.comparison.as_mut() {
        comparison.pairs = Some(vec![("GLOVE".into(), "GLOVE".into())]);
    }
    assert!(matches!(validate_config(&config).unwrap_err(), ValidationError::SelfComparison(_)));
}

#[test]
fn test_template_without_placeholder() {
    let mut config = create_valid_config();
    if let Some(comparison) = config.comparison.as_mut() {
        comparison.template = "ranks.csv".into();
    }
    let err = validate_config(&config).unwrap_err();
    assert!(matches!(err, ValidationError::TemplateMissingPlaceholder(_)));
    assert!(err.to_string().contains("'{}'"));
}

#[test]
fn test_empty_checkpoint_steps() {
    let mut config = create_valid_config();
    if let Some(checkpoint) = config.checkpoint.as_mut() {
        checkpoint.steps = Some(Vec::new());
    }
    assert!(matches!(validate_config(&config).unwrap_err(), ValidationError::EmptyCheckpointSteps));
}
