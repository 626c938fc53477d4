//! Artifact port: Trait for loading the trained model and its companions.
//!
//! This trait abstracts where the artifacts live (filesystem JSON, in-memory
//! fixtures) from the assessment service.

use crate::domain::{ModelArtifact, ModelMetadata};

/// Source of the three read-once artifacts the core depends on.
///
/// Each method is called once at service construction. Implementations do
/// not need to validate cross-artifact consistency; the service does that.
pub trait ArtifactSource: Send + Sync {
    /// Error type for artifact retrieval.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the fitted preprocessing and linear-stage parameters.
    ///
    /// # Errors
    /// Returns error if the artifact is missing or malformed.
    fn load_model(&self) -> Result<ModelArtifact, Self::Error>;

    /// Load the metadata record declaring the canonical feature order.
    ///
    /// # Errors
    /// Returns error if the metadata is missing or malformed.
    fn load_metadata(&self) -> Result<ModelMetadata, Self::Error>;

    /// Load the reference population's precomputed probabilities.
    ///
    /// # Errors
    /// Returns error if the scores are missing or malformed.
    fn load_reference_scores(&self) -> Result<Vec<f64>, Self::Error>;
}
