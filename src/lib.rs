//! # EMRA
//!
//! Early Metabolic Risk Assessment: score calibration and explainability for
//! a four-biomarker linear risk model.
//!
//! This crate provides:
//! - Percentile calibration of a raw probability against a frozen reference population
//! - Mapping of the percentile to one of four risk categories with static narrative
//! - Per-feature contribution and deviation analysis of the linear predictor
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Pure types and functions (biomarkers, model, calibration, categories, contributions)
//! - `ports`: Trait definitions for artifact sources
//! - `adapters`: Concrete implementations (JSON model directory, in-memory, log sanitizer)
//! - `application`: The assessment service and the report record handed to renderers
//! - `config`: Environment-driven process configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{Assessment, AssessmentReport, AssessmentService};
pub use domain::{BiomarkerInput, FeatureContribution, Percentile, RiskCategory};

/// Result type for EMRA operations
pub type Result<T> = std::result::Result<T, EmraError>;

/// Main error type for EMRA
#[derive(Debug, thiserror::Error)]
pub enum EmraError {
    #[error("Model error: {0}")]
    Model(#[from] domain::ModelError),

    #[error("Artifact load failed: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Feature order mismatch: metadata declares {expected:?}, model expects {found:?}")]
    FeatureOrderMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Reference size mismatch: metadata declares {declared}, loaded {found}")]
    ReferenceSizeMismatch { declared: usize, found: usize },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
