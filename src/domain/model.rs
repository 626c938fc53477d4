//! Linear risk model: imputer, standard scaler and logistic stage bound per feature.
//!
//! The trained artifact ships its parameters as parallel arrays. They are bound
//! once, at load, into an ordered list of [`FeatureSpec`] so that a feature's
//! name, preprocessing statistics and weight can never drift apart.

use serde::{Deserialize, Serialize};

/// Error type for model-level computation and validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid model parameter: {0}")]
    InvalidParameter(String),

    #[error("Reference distribution is empty")]
    EmptyReference,

    #[error("Non-finite value for {feature}: {value}")]
    NonFiniteInput { feature: String, value: f64 },

    #[error("Dimension mismatch: expected {expected} values, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// Model parameters as exported by the training pipeline.
///
/// All vectors are indexed by position in `feature_names`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    /// Imputer statistics (training medians), substituted for missing values.
    pub imputer_fill: Vec<f64>,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Metadata record declaring the canonical feature order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub model_version: Option<String>,
    /// Size of the validation population behind the reference scores.
    #[serde(default)]
    pub n_reference: Option<usize>,
}

/// One feature of the linear model with its preprocessing statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub fill_value: f64,
    pub mean: f64,
    pub scale: f64,
    pub weight: f64,
}

impl FeatureSpec {
    /// Impute then standardize a single raw value.
    fn standardize(&self, raw: Option<f64>) -> Result<f64, ModelError> {
        let x = match raw {
            Some(v) if !v.is_finite() => {
                return Err(ModelError::NonFiniteInput {
                    feature: self.name.clone(),
                    value: v,
                })
            }
            Some(v) => v,
            None => self.fill_value,
        };
        let z = (x - self.mean) / self.scale;
        if !z.is_finite() {
            return Err(ModelError::NonFiniteInput {
                feature: self.name.clone(),
                value: z,
            });
        }
        Ok(z)
    }
}

/// Imputer + scaler + logistic regression over a fixed, ordered feature list.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRiskModel {
    features: Vec<FeatureSpec>,
    intercept: f64,
}

impl LinearRiskModel {
    /// Build a model from bound feature specs.
    ///
    /// # Errors
    /// Returns `InvalidParameter` if there are no features, names are empty or
    /// repeated, any parameter is non-finite, or any scale is not positive.
    pub fn new(features: Vec<FeatureSpec>, intercept: f64) -> Result<Self, ModelError> {
        if features.is_empty() {
            return Err(ModelError::InvalidParameter(
                "model declares no features".into(),
            ));
        }
        if !intercept.is_finite() {
            return Err(ModelError::InvalidParameter(format!(
                "intercept is not finite: {intercept}"
            )));
        }

        for (i, spec) in features.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(ModelError::InvalidParameter(format!(
                    "feature {i} has an empty name"
                )));
            }
            if features[..i].iter().any(|other| other.name == spec.name) {
                return Err(ModelError::InvalidParameter(format!(
                    "duplicate feature name {}",
                    spec.name
                )));
            }
            let params = [
                ("fill value", spec.fill_value),
                ("mean", spec.mean),
                ("scale", spec.scale),
                ("weight", spec.weight),
            ];
            if let Some((what, value)) = params.iter().find(|(_, v)| !v.is_finite()) {
                return Err(ModelError::InvalidParameter(format!(
                    "{} {what} is not finite: {value}",
                    spec.name
                )));
            }
            if spec.scale <= 0.0 {
                return Err(ModelError::InvalidParameter(format!(
                    "{} scale must be > 0, got {}",
                    spec.name, spec.scale
                )));
            }
        }

        Ok(Self {
            features,
            intercept,
        })
    }

    /// Bind an exported artifact's parallel arrays into one ordered structure.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` if any parameter array disagrees in length
    /// with `feature_names`, or any error from [`LinearRiskModel::new`].
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        let n = artifact.feature_names.len();
        for len in [
            artifact.imputer_fill.len(),
            artifact.scaler_mean.len(),
            artifact.scaler_scale.len(),
            artifact.coefficients.len(),
        ] {
            if len != n {
                return Err(ModelError::DimensionMismatch {
                    expected: n,
                    found: len,
                });
            }
        }

        let features = artifact
            .feature_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| FeatureSpec {
                name,
                fill_value: artifact.imputer_fill[i],
                mean: artifact.scaler_mean[i],
                scale: artifact.scaler_scale[i],
                weight: artifact.coefficients[i],
            })
            .collect();

        Self::new(features, artifact.intercept)
    }

    #[must_use]
    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    #[must_use]
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    #[must_use]
    pub fn weights(&self) -> Vec<f64> {
        self.features.iter().map(|f| f.weight).collect()
    }

    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Impute missing values, then standardize with the training mean and scale.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` on a wrong-length input and `NonFiniteInput`
    /// for a present NaN or infinite value or a z-score that overflows.
    pub fn preprocess(&self, raw: &[Option<f64>]) -> Result<Vec<f64>, ModelError> {
        if raw.len() != self.features.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.features.len(),
                found: raw.len(),
            });
        }
        self.features
            .iter()
            .zip(raw)
            .map(|(spec, &value)| spec.standardize(value))
            .collect()
    }

    /// Linear predictor (log-odds) over already standardized features.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` on a wrong-length input.
    pub fn logit(&self, standardized: &[f64]) -> Result<f64, ModelError> {
        if standardized.len() != self.features.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.features.len(),
                found: standardized.len(),
            });
        }
        let sum: f64 = self
            .features
            .iter()
            .zip(standardized)
            .map(|(spec, z)| spec.weight * z)
            .sum();
        Ok(self.intercept + sum)
    }

    /// Probability of the positive class for a raw feature vector.
    ///
    /// # Errors
    /// Propagates preprocessing errors.
    pub fn predict_probability(&self, raw: &[Option<f64>]) -> Result<f64, ModelError> {
        let z = self.preprocess(raw)?;
        self.predict_standardized(&z)
    }

    /// Probability of the positive class for already standardized features.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` on a wrong-length input.
    pub fn predict_standardized(&self, standardized: &[f64]) -> Result<f64, ModelError> {
        Ok(sigmoid(self.logit(standardized)?))
    }
}

/// Logistic function, evaluated without overflow for large |x|.
fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn artifact() -> ModelArtifact {
        ModelArtifact {
            feature_names: vec!["LBXGLU".into(), "LBXGH".into()],
            imputer_fill: vec![95.0, 5.5],
            scaler_mean: vec![100.0, 5.5],
            scaler_scale: vec![10.0, 0.5],
            coefficients: vec![0.8, 1.2],
            intercept: -1.0,
        }
    }

    #[test]
    fn test_from_artifact_binds_by_position() {
        let model = LinearRiskModel::from_artifact(artifact()).expect("Valid artifact");
        assert_eq!(model.feature_names(), vec!["LBXGLU", "LBXGH"]);
        assert_eq!(model.features()[1].scale, 0.5);
        assert_eq!(model.weights(), vec![0.8, 1.2]);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let mut a = artifact();
        a.scaler_scale.pop();
        assert_eq!(
            LinearRiskModel::from_artifact(a),
            Err(ModelError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let mut zero_scale = artifact();
        zero_scale.scaler_scale[0] = 0.0;
        assert!(LinearRiskModel::from_artifact(zero_scale).is_err());

        let mut nan_weight = artifact();
        nan_weight.coefficients[1] = f64::NAN;
        assert!(LinearRiskModel::from_artifact(nan_weight).is_err());

        let mut dup = artifact();
        dup.feature_names[1] = "LBXGLU".into();
        assert!(LinearRiskModel::from_artifact(dup).is_err());

        let empty = ModelArtifact {
            feature_names: vec![],
            imputer_fill: vec![],
            scaler_mean: vec![],
            scaler_scale: vec![],
            coefficients: vec![],
            intercept: 0.0,
        };
        assert!(LinearRiskModel::from_artifact(empty).is_err());
    }

    #[test]
    fn test_preprocess_imputes_then_scales() {
        let model = LinearRiskModel::from_artifact(artifact()).expect("Valid artifact");
        let z = model.preprocess(&[Some(120.0), None]).expect("Finite input");
        assert_abs_diff_eq!(z[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(z[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_input_fails_loudly() {
        let model = LinearRiskModel::from_artifact(artifact()).expect("Valid artifact");
        let err = model.preprocess(&[Some(f64::NAN), Some(5.0)]).unwrap_err();
        assert!(matches!(err, ModelError::NonFiniteInput { ref feature, .. } if feature == "LBXGLU"));

        assert!(model
            .predict_probability(&[Some(100.0), Some(f64::INFINITY)])
            .is_err());
    }

    #[test]
    fn test_overflowing_z_fails_loudly() {
        let mut a = artifact();
        a.scaler_scale[0] = 1e-310;
        let model = LinearRiskModel::from_artifact(a).expect("Positive scale");
        let err = model.preprocess(&[Some(120.0), Some(5.5)]).unwrap_err();
        assert_eq!(
            err,
            ModelError::NonFiniteInput {
                feature: "LBXGLU".into(),
                value: f64::INFINITY
            }
        );
    }

    #[test]
    fn test_probability_at_mean_is_sigmoid_of_intercept() {
        let model = LinearRiskModel::from_artifact(artifact()).expect("Valid artifact");
        let p = model
            .predict_probability(&[Some(100.0), Some(5.5)])
            .expect("Finite input");
        assert_abs_diff_eq!(p, 1.0 / (1.0 + 1.0_f64.exp()), epsilon = 1e-12);
    }

    #[test]
    fn test_sigmoid_is_bounded_for_extreme_logits() {
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert_abs_diff_eq!(sigmoid(0.0), 0.5);
    }
}
