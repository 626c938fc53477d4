//! Adapters layer: Concrete implementations of ports.
//!
//! - `json`: model directory of JSON exports, with optional digest manifest
//! - `memory`: artifacts supplied in memory (fixtures, embedding callers)
//! - `sanitize`: redaction of measurement values in log output

pub mod json;
pub mod memory;
pub mod sanitize;

pub use json::{ArtifactError, JsonArtifactStore};
pub use memory::InMemoryArtifacts;
