//! Probability-to-score mapping and the model-side scoring contract.

use crate::error::ScoreEngineError;
use crate::features::FeatureVector;
use crate::model::artifact::ModelArtifact;
use crate::types::RiskTier;
use crate::ScoreEngineResult;

/// `score = round(probability * 100)`, clamped to [0, 100].
pub fn probability_to_score(probability: f64) -> u8 {
    (probability.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Run one feature vector through a trained artifact.
///
/// Returns (repayment probability, credit score, risk tier). Refuses
/// rejected artifacts and schema mismatches: a tier is only ever produced
/// from an actually computed probability.
pub fn score_vector(
    artifact: &ModelArtifact,
    vector: &FeatureVector,
) -> ScoreEngineResult<(f64, u8, RiskTier)> {
    if !artifact.is_accepted() {
        return Err(ScoreEngineError::InvalidInput {
            field: "artifact".to_string(),
            reason: format!(
                "artifact '{}' was rejected at validation and cannot score",
                artifact.version
            ),
        });
    }
    if artifact.schema_version != crate::features::FEATURE_SCHEMA_VERSION {
        return Err(ScoreEngineError::InvalidInput {
            field: "schema_version".to_string(),
            reason: format!(
                "artifact schema '{}' does not match engine schema '{}'",
                artifact.schema_version,
                crate::features::FEATURE_SCHEMA_VERSION
            ),
        });
    }

    let probability = artifact.forest.predict_proba(&vector.to_f64_row());
    let score = probability_to_score(probability);
    Ok((probability, score, RiskTier::from_score(score)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_mapping_and_clamping() {
        assert_eq!(probability_to_score(0.0), 0);
        assert_eq!(probability_to_score(1.0), 100);
        assert_eq!(probability_to_score(0.394), 39);
        assert_eq!(probability_to_score(0.396), 40);
        assert_eq!(probability_to_score(0.696), 70);
        assert_eq!(probability_to_score(-0.5), 0);
        assert_eq!(probability_to_score(1.5), 100);
    }

    #[test]
    fn test_score_tier_agreement_at_boundaries() {
        assert_eq!(RiskTier::from_score(probability_to_score(0.39)), RiskTier::High);
        assert_eq!(RiskTier::from_score(probability_to_score(0.40)), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(probability_to_score(0.69)), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(probability_to_score(0.70)), RiskTier::Low);
    }
}
