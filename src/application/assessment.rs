//! Assessment service: Runs one biomarker assessment end to end.
//!
//! This service coordinates:
//! - Loading and cross-checking the model, metadata and reference artifacts
//! - Feature assembly in the metadata's declared order
//! - Inference, percentile calibration and category lookup
//! - Per-feature contribution analysis
//!
//! The loaded state is immutable and shared behind `Arc`, so one service can
//! be cloned into or shared across threads without locking.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapters::ArtifactError;
use crate::domain::{
    calibrate, classify, explain, BiomarkerInput, FeatureContribution, LinearRiskModel,
    ModelMetadata, Percentile, ReferenceDistribution, RiskCategory,
};
use crate::ports::ArtifactSource;
use crate::EmraError;

/// Result of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Unique identifier
    pub id: String,

    /// Raw biomarker inputs as entered
    pub input: BiomarkerInput,

    /// Feature codes in the order the metadata declares
    pub feature_order: Vec<String>,

    /// Model probability for the positive class (0.0 to 1.0)
    pub raw_score: f64,

    /// Rank within the reference population, clamped to [20, 90]
    pub percentile: Percentile,

    pub category: RiskCategory,

    /// Sorted by contribution share, largest first
    pub contributions: Vec<FeatureContribution>,

    /// Timestamp of assessment
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Service for running assessments against a loaded model.
#[derive(Debug, Clone)]
pub struct AssessmentService {
    model: Arc<LinearRiskModel>,
    metadata: Arc<ModelMetadata>,
    reference: Arc<ReferenceDistribution>,
}

impl AssessmentService {
    /// Load all artifacts from `source` and validate them against each other.
    ///
    /// # Errors
    /// Returns error if any artifact fails to load or is invalid, if the
    /// reference distribution is empty, or if the metadata's feature order
    /// differs from the model's.
    pub fn from_source<A>(source: &A) -> Result<Self, EmraError>
    where
        A: ArtifactSource,
        A::Error: Into<ArtifactError>,
    {
        tracing::info!("Loading assessment artifacts...");

        let artifact = source.load_model().map_err(|e| EmraError::Artifact(e.into()))?;
        let metadata = source
            .load_metadata()
            .map_err(|e| EmraError::Artifact(e.into()))?;
        let scores = source
            .load_reference_scores()
            .map_err(|e| EmraError::Artifact(e.into()))?;

        let model = LinearRiskModel::from_artifact(artifact)?;
        let reference = ReferenceDistribution::new(scores)?;

        Self::new(model, metadata, reference)
    }

    /// Assemble a service from already-built parts.
    ///
    /// # Errors
    /// Returns `FeatureOrderMismatch` if the metadata and model disagree on
    /// feature order, and `ReferenceSizeMismatch` if the metadata declares a
    /// reference size different from the distribution's.
    pub fn new(
        model: LinearRiskModel,
        metadata: ModelMetadata,
        reference: ReferenceDistribution,
    ) -> Result<Self, EmraError> {
        let model_order = model.feature_names();
        if metadata.feature_names.iter().map(String::as_str).ne(model_order.iter().copied()) {
            tracing::error!(
                "Feature order mismatch between metadata and model; refusing to load"
            );
            return Err(EmraError::FeatureOrderMismatch {
                expected: metadata.feature_names.clone(),
                found: model_order.iter().map(|s| s.to_string()).collect(),
            });
        }

        if let Some(declared) = metadata.n_reference {
            if declared != reference.len() {
                return Err(EmraError::ReferenceSizeMismatch {
                    declared,
                    found: reference.len(),
                });
            }
        }

        tracing::info!(
            "Loaded model {} (n_features={}, n_reference={})",
            metadata.model_name.as_deref().unwrap_or("<unnamed>"),
            model.len(),
            reference.len()
        );

        Ok(Self {
            model: Arc::new(model),
            metadata: Arc::new(metadata),
            reference: Arc::new(reference),
        })
    }

    #[must_use]
    pub fn model(&self) -> &LinearRiskModel {
        &self.model
    }

    #[must_use]
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn reference(&self) -> &ReferenceDistribution {
        &self.reference
    }

    /// Run the full pipeline for one set of biomarkers.
    ///
    /// 1. Assemble features in declared order
    /// 2. Impute and standardize
    /// 3. Predict probability
    /// 4. Calibrate to a percentile and classify
    /// 5. Decompose into per-feature contributions
    ///
    /// # Errors
    /// Returns error if an input is non-finite or the metadata names a
    /// biomarker the input does not carry.
    pub fn assess(&self, input: &BiomarkerInput) -> Result<Assessment, EmraError> {
        tracing::debug!("Step 1: Assembling feature vector...");
        let raw: Vec<Option<f64>> = input
            .to_ordered_vec(&self.metadata.feature_names)
            .map_err(EmraError::Validation)?
            .into_iter()
            .map(Some)
            .collect();

        tracing::debug!("Step 2: Imputing and standardizing...");
        let standardized = self.model.preprocess(&raw)?;

        tracing::debug!("Step 3: Predicting...");
        let raw_score = self.model.predict_standardized(&standardized)?;

        tracing::debug!("Step 4: Calibrating against reference population...");
        let percentile = calibrate(raw_score, &self.reference)?;
        let category = classify(percentile);

        tracing::debug!("Step 5: Explaining contributions...");
        let contributions = explain(
            &standardized,
            &self.model.weights(),
            self.model.intercept(),
            &self.model.feature_names(),
        )?;

        tracing::info!(
            "Assessment complete: percentile={}, category={}",
            percentile,
            category
        );

        Ok(Assessment {
            id: uuid_v4(),
            input: *input,
            feature_order: self.metadata.feature_names.clone(),
            raw_score,
            percentile,
            category,
            contributions,
            created_at: chrono::Utc::now(),
        })
    }
}

/// Generate a random UUID v4 string.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryArtifacts;
    use crate::domain::{Direction, ModelArtifact, ModelError, FEATURE_CODES};

    /// Means sit at the form defaults so the default input scores the intercept.
    fn artifact() -> ModelArtifact {
        ModelArtifact {
            feature_names: FEATURE_CODES.iter().map(|s| s.to_string()).collect(),
            imputer_fill: vec![90.0, 5.4, 120.0, 24.0],
            scaler_mean: vec![90.0, 5.4, 120.0, 24.0],
            scaler_scale: vec![10.0, 0.4, 50.0, 4.0],
            coefficients: vec![0.6, 0.9, 0.4, 0.5],
            intercept: -1.0,
        }
    }

    fn reference() -> Vec<f64> {
        (1..=100).map(|i| f64::from(i) / 100.0).collect()
    }

    fn service() -> AssessmentService {
        AssessmentService::from_source(&InMemoryArtifacts::new(artifact(), reference()))
            .expect("Should load")
    }

    #[test]
    fn test_assess_default_input() {
        let assessment = service()
            .assess(&BiomarkerInput::default())
            .expect("Should assess");

        // sigmoid(-1) = 0.2689 -> 26 of 100 reference scores <= it
        assert!((assessment.raw_score - 0.268_941_421).abs() < 1e-6);
        assert_eq!(assessment.percentile.value(), 26);
        assert_eq!(assessment.category, RiskCategory::LowRisk);
        assert_eq!(assessment.contributions.len(), 4);
        assert!(assessment
            .contributions
            .iter()
            .all(|c| c.contribution_pct == 0.0 && c.direction == Direction::Decrease));
        assert_eq!(assessment.id.len(), 36);
    }

    #[test]
    fn test_assess_elevated_input() {
        let input = BiomarkerInput::new(130.0, 6.4, 300.0, 34.0);
        let assessment = service().assess(&input).expect("Should assess");

        assert_eq!(assessment.category, RiskCategory::ElevatedRisk);
        assert_eq!(assessment.percentile.value(), 90);
        // 0.6 x 4.0 = 2.4 on glucose outweighs 0.9 x 2.5 = 2.25 on HbA1c
        assert_eq!(assessment.contributions[0].feature, "LBXGLU");
        assert_eq!(assessment.contributions[1].feature, "LBXGH");
        assert!(assessment
            .contributions
            .iter()
            .all(|c| c.direction == Direction::Increase));
        let sum: f64 = assessment.contributions.iter().map(|c| c.contribution_pct).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_assess_is_repeatable() {
        let service = service();
        let input = BiomarkerInput::new(104.0, 5.8, 160.0, 27.0);
        let a = service.assess(&input).expect("Should assess");
        let b = service.assess(&input).expect("Should assess");

        assert_eq!(a.raw_score, b.raw_score);
        assert_eq!(a.percentile, b.percentile);
        assert_eq!(a.contributions, b.contributions);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_feature_order_mismatch_is_fatal() {
        let mut metadata_names: Vec<String> =
            FEATURE_CODES.iter().map(|s| s.to_string()).collect();
        metadata_names.swap(0, 1);
        let source = InMemoryArtifacts::new(artifact(), reference()).with_metadata(
            ModelMetadata {
                feature_names: metadata_names,
                model_name: None,
                model_version: None,
                n_reference: None,
            },
        );

        let err = AssessmentService::from_source(&source).unwrap_err();
        assert!(matches!(err, EmraError::FeatureOrderMismatch { .. }));
    }

    #[test]
    fn test_report_follows_declared_feature_order() {
        // HbA1c first: same parameters, positions 0 and 1 swapped
        let mut a = artifact();
        for values in [
            &mut a.imputer_fill,
            &mut a.scaler_mean,
            &mut a.scaler_scale,
            &mut a.coefficients,
        ] {
            values.swap(0, 1);
        }
        a.feature_names.swap(0, 1);
        let declared = a.feature_names.clone();

        let service = AssessmentService::from_source(&InMemoryArtifacts::new(a, reference()))
            .expect("Consistent artifacts");
        let assessment = service
            .assess(&BiomarkerInput::new(101.0, 5.9, 180.0, 29.5))
            .expect("Should assess");
        assert_eq!(assessment.feature_order, declared);

        let report = crate::AssessmentReport::from_assessment(&assessment);
        let codes: Vec<&str> = report.inputs.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["LBXGH", "LBXGLU", "LBXTR", "BMXBMI"]);
        assert_eq!(report.inputs[0].value, 5.9);
        assert_eq!(report.inputs[1].value, 101.0);
    }

    #[test]
    fn test_empty_reference_is_fatal() {
        let source = InMemoryArtifacts::new(artifact(), vec![]);
        let err = AssessmentService::from_source(&source).unwrap_err();
        assert!(matches!(err, EmraError::Model(ModelError::EmptyReference)));
    }

    #[test]
    fn test_reference_size_mismatch_is_fatal() {
        let mut source = InMemoryArtifacts::new(artifact(), reference());
        source.metadata.n_reference = Some(500);
        let err = AssessmentService::from_source(&source).unwrap_err();
        assert!(matches!(
            err,
            EmraError::ReferenceSizeMismatch {
                declared: 500,
                found: 100
            }
        ));
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let input = BiomarkerInput {
            triglycerides: f64::NAN,
            ..Default::default()
        };
        let err = service().assess(&input).unwrap_err();
        assert!(matches!(
            err,
            EmraError::Model(ModelError::NonFiniteInput { ref feature, .. }) if feature == "LBXTR"
        ));
    }

    #[test]
    fn test_unknown_metadata_feature_is_rejected() {
        let mut a = artifact();
        a.feature_names[3] = "BMXWAIST".into();
        let service = AssessmentService::from_source(&InMemoryArtifacts::new(a, reference()))
            .expect("Consistent artifacts");
        let err = service.assess(&BiomarkerInput::default()).unwrap_err();
        assert!(matches!(err, EmraError::Validation(ref m) if m.contains("BMXWAIST")));
    }

    #[test]
    fn test_service_is_shareable_across_threads() {
        let service = service();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let service = service.clone();
                std::thread::spawn(move || {
                    let input = BiomarkerInput::new(90.0 + f64::from(i) * 10.0, 5.4, 120.0, 24.0);
                    service.assess(&input).map(|a| a.percentile)
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().expect("Thread panicked").is_ok());
        }
    }

    #[test]
    fn test_uuid_generation() {
        let id1 = uuid_v4();
        let id2 = uuid_v4();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);
    }
}
