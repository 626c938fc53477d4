//! Percentile calibration against a frozen reference population.
//!
//! A raw model probability is ranked among the probabilities the same model
//! produced for a validation cohort. The rank is expressed in percent, clamped
//! to [20, 90] and rounded half-to-even.

use serde::{Deserialize, Serialize};

use super::model::ModelError;

/// Sorted, non-empty sample of reference probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDistribution {
    scores: Vec<f64>,
}

impl ReferenceDistribution {
    /// Build a distribution, sorting the scores once.
    ///
    /// # Errors
    /// Returns `EmptyReference` for an empty sample and `NonFiniteInput` if any
    /// score is NaN or infinite.
    pub fn new(mut scores: Vec<f64>) -> Result<Self, ModelError> {
        if scores.is_empty() {
            return Err(ModelError::EmptyReference);
        }
        if let Some(&bad) = scores.iter().find(|s| !s.is_finite()) {
            return Err(ModelError::NonFiniteInput {
                feature: "reference score".into(),
                value: bad,
            });
        }
        scores.sort_by(f64::total_cmp);
        Ok(Self { scores })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.scores
    }

    /// Number of reference scores less than or equal to `score`.
    ///
    /// Right-side insertion point: ties count as already passed.
    #[must_use]
    pub fn rank(&self, score: f64) -> usize {
        self.scores.partition_point(|&s| s <= score)
    }
}

/// Percentile rank, always within [`Percentile::MIN`, `Percentile::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Percentile(u8);

impl Percentile {
    pub const MIN: u8 = 20;
    pub const MAX: u8 = 90;

    /// # Errors
    /// Returns the value back if it lies outside [20, 90].
    pub fn new(value: u8) -> Result<Self, u8> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(value)
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Clamp a raw percentage to [20, 90], then round half to even.
    ///
    /// NaN is the caller's responsibility; it clamps to the floor.
    #[must_use]
    pub fn from_percentage(pct: f64) -> Self {
        let clamped = if pct.is_nan() {
            f64::from(Self::MIN)
        } else {
            pct.clamp(f64::from(Self::MIN), f64::from(Self::MAX))
        };
        // Within [20.0, 90.0] after the clamp, so the cast is exact.
        Self(clamped.round_ties_even() as u8)
    }
}

impl TryFrom<u8> for Percentile {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).map_err(|v| {
            format!(
                "percentile {v} outside [{}, {}]",
                Percentile::MIN,
                Percentile::MAX
            )
        })
    }
}

impl From<Percentile> for u8 {
    fn from(p: Percentile) -> Self {
        p.0
    }
}

impl std::fmt::Display for Percentile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Map a raw probability to its bounded percentile within `reference`.
///
/// # Errors
/// Returns `NonFiniteInput` if `raw_score` is NaN or infinite.
pub fn calibrate(raw_score: f64, reference: &ReferenceDistribution) -> Result<Percentile, ModelError> {
    if !raw_score.is_finite() {
        return Err(ModelError::NonFiniteInput {
            feature: "raw score".into(),
            value: raw_score,
        });
    }
    let pct = reference.rank(raw_score) as f64 / reference.len() as f64 * 100.0;
    Ok(Percentile::from_percentage(pct))
}
