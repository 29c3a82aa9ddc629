//! Configuration validation logic

use super::error::ValidationError;
use crate::config::schema::AnalysisConfig;

/// Validate an analysis configuration
///
/// Checks:
/// - Projections are positive
/// - Lists that are given are non-empty
/// - Comparison pairs name configured, distinct models
/// - The prediction file template can be filled
pub fn validate_config(config: &AnalysisConfig) -> Result<(), ValidationError> {
    if config.projection == Some(0) {
        return Err(ValidationError::InvalidProjection(0));
    }

    if config.encodings.as_ref().is_some_and(Vec::is_empty) {
        return Err(ValidationError::EmptyEncodings);
    }

    if let Some(brain) = &config.brain {
        if brain.projection == Some(0) {
            return Err(ValidationError::InvalidProjection(0));
        }
        if brain.field.is_empty() {
            return Err(ValidationError::EmptyBrainField);
        }
    }

    if let Some(comparison) = &config.comparison {
        if comparison.models.len() < 2 {
            return Err(ValidationError::TooFewModels(comparison.models.len()));
        }

        for (a, b) in comparison.pairs.iter().flatten() {
            for model in [a, b] {
                if !comparison.models.contains_key(model) {
                    return Err(ValidationError::UnknownPairModel(model.clone()));
                }
            }
            if a == b {
                return Err(ValidationError::SelfComparison(a.clone()));
            }
        }

        if !comparison.template.contains("{}") {
            return Err(ValidationError::TemplateMissingPlaceholder(comparison.template.clone()));
        }
    }

    if let Some(checkpoint) = &config.checkpoint {
        if checkpoint.steps.as_ref().is_some_and(Vec::is_empty) {
            return Err(ValidationError::EmptyCheckpointSteps);
        }
    }

    Ok(())
}
