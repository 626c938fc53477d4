//! Per-feature decomposition of a linear risk prediction.
//!
//! Each feature contributes `weight × z` to the log-odds. Contributions are
//! reported as a share of the total absolute contribution, together with a
//! qualitative band for how far the feature sits from the training mean.

use serde::{Deserialize, Serialize};

use super::model::ModelError;

/// Whether a feature pushes the prediction up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    /// Also used for an exactly zero contribution.
    Decrease,
}

impl Direction {
    #[must_use]
    pub fn from_contribution(contribution: f64) -> Self {
        if contribution > 0.0 {
            Self::Increase
        } else {
            Self::Decrease
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::Increase => "increases risk",
            Self::Decrease => "decreases risk",
        })
    }
}

/// Magnitude band of a standardized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviationBand {
    /// |z| < 0.5
    Negligible,
    /// 0.5 ≤ |z| < 1
    Slight,
    /// 1 ≤ |z| < 2
    Moderate,
    /// |z| ≥ 2
    Significant,
}

impl DeviationBand {
    #[must_use]
    pub fn from_z(z: f64) -> Self {
        let z = z.abs();
        if z < 0.5 {
            Self::Negligible
        } else if z < 1.0 {
            Self::Slight
        } else if z < 2.0 {
            Self::Moderate
        } else {
            Self::Significant
        }
    }

    fn adverb(&self) -> &'static str {
        match self {
            Self::Negligible => "Negligibly",
            Self::Slight => "Slightly",
            Self::Moderate => "Moderately",
            Self::Significant => "Significantly",
        }
    }

    /// Display text with the side of the population mean encoded.
    ///
    /// z > 0 reads as above; z ≤ 0 reads as below.
    #[must_use]
    pub fn label(&self, z: f64) -> String {
        let side = if z > 0.0 { "above" } else { "below" };
        format!("{} {side} population mean", self.adverb())
    }
}

/// One feature's share in a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    /// Standardized (z-scored) value
    pub z_score: f64,
    /// Signed weight × z
    pub contribution: f64,
    /// Share of total absolute contribution, 0-100
    pub contribution_pct: f64,
    pub direction: Direction,
    pub deviation: DeviationBand,
}

impl FeatureContribution {
    #[must_use]
    pub fn deviation_label(&self) -> String {
        self.deviation.label(self.z_score)
    }
}

/// Decompose a prediction into per-feature contributions.
///
/// The intercept is a constant offset and is not attributed to any feature.
/// When every contribution is zero all percentages are zero. The output is
/// sorted by percentage, descending, keeping input order among ties.
///
/// # Errors
/// Returns `DimensionMismatch` if the three inputs differ in length,
/// `InvalidParameter` for a NaN or infinite weight, and `NonFiniteInput`
/// for a NaN or infinite standardized value or a contribution that
/// overflows.
pub fn explain<S: AsRef<str>>(
    standardized: &[f64],
    weights: &[f64],
    intercept: f64,
    feature_names: &[S],
) -> Result<Vec<FeatureContribution>, ModelError> {
    let n = feature_names.len();
    for len in [standardized.len(), weights.len()] {
        if len != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                found: len,
            });
        }
    }
    if let Some((name, &z)) = feature_names
        .iter()
        .zip(standardized)
        .find(|(_, z)| !z.is_finite())
    {
        return Err(ModelError::NonFiniteInput {
            feature: name.as_ref().to_string(),
            value: z,
        });
    }

    if let Some((name, &w)) = feature_names
        .iter()
        .zip(weights)
        .find(|(_, w)| !w.is_finite())
    {
        return Err(ModelError::InvalidParameter(format!(
            "{} weight is not finite: {w}",
            name.as_ref()
        )));
    }

    let raw: Vec<f64> = weights
        .iter()
        .zip(standardized)
        .map(|(w, z)| w * z)
        .collect();
    if let Some((name, &c)) = feature_names.iter().zip(&raw).find(|(_, c)| !c.is_finite()) {
        return Err(ModelError::NonFiniteInput {
            feature: name.as_ref().to_string(),
            value: c,
        });
    }
    let total: f64 = raw.iter().map(|c| c.abs()).sum();
    if !total.is_finite() {
        return Err(ModelError::NonFiniteInput {
            feature: "total contribution".into(),
            value: total,
        });
    }

    tracing::trace!(
        logit = intercept + raw.iter().sum::<f64>(),
        total_abs = total,
        "Decomposed linear predictor"
    );

    let mut contributions: Vec<FeatureContribution> = feature_names
        .iter()
        .zip(standardized)
        .zip(&raw)
        .map(|((name, &z), &c)| FeatureContribution {
            feature: name.as_ref().to_string(),
            z_score: z,
            contribution: c,
            contribution_pct: if total == 0.0 {
                0.0
            } else {
                100.0 * c.abs() / total
            },
            direction: Direction::from_contribution(c),
            deviation: DeviationBand::from_z(z),
        })
        .collect();

    // sort_by is stable: ties keep feature order
    contributions.sort_by(|a, b| b.contribution_pct.total_cmp(&a.contribution_pct));
    Ok(contributions)
}
