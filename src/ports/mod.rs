//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the assessment core and wherever its artifacts come from.

mod artifacts;

pub use artifacts::ArtifactSource;
