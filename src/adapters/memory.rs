//! In-memory adapter: ArtifactSource over values already in memory.
//!
//! Used for synthetic fixtures and for callers that obtain artifacts from
//! somewhere other than the filesystem.

use std::convert::Infallible;

use crate::domain::{ModelArtifact, ModelMetadata};
use crate::ports::ArtifactSource;

/// Artifacts held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryArtifacts {
    pub model: ModelArtifact,
    pub metadata: ModelMetadata,
    pub reference_scores: Vec<f64>,
}

impl InMemoryArtifacts {
    /// Create artifacts whose metadata simply mirrors the model's feature order.
    #[must_use]
    pub fn new(model: ModelArtifact, reference_scores: Vec<f64>) -> Self {
        let metadata = ModelMetadata {
            feature_names: model.feature_names.clone(),
            model_name: None,
            model_version: None,
            n_reference: Some(reference_scores.len()),
        };
        Self {
            model,
            metadata,
            reference_scores,
        }
    }

    /// Replace the metadata record.
    #[must_use]
    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl ArtifactSource for InMemoryArtifacts {
    type Error = Infallible;

    fn load_model(&self) -> Result<ModelArtifact, Self::Error> {
        Ok(self.model.clone())
    }

    fn load_metadata(&self) -> Result<ModelMetadata, Self::Error> {
        Ok(self.metadata.clone())
    }

    fn load_reference_scores(&self) -> Result<Vec<f64>, Self::Error> {
        Ok(self.reference_scores.clone())
    }
}
