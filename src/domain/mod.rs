//! Domain layer: Core assessment types and logic.
//!
//! This module contains pure Rust types and pure functions with no I/O.
//! Everything here is deterministic and safe to call from any thread.

mod biomarker;
mod contribution;
mod model;
mod percentile;
mod risk;

pub use biomarker::{
    BiomarkerInput, BMI_CODE, FEATURE_CODES, GLUCOSE_CODE, HBA1C_CODE, TRIGLYCERIDES_CODE,
};
pub use contribution::{explain, DeviationBand, Direction, FeatureContribution};
pub use model::{FeatureSpec, LinearRiskModel, ModelArtifact, ModelError, ModelMetadata};
pub use percentile::{calibrate, Percentile, ReferenceDistribution};
pub use risk::{classify, RiskCategory, RiskNarrative, RiskTone};
