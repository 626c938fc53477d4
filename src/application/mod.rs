//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the assessment use case and the report handed to renderers.

mod assessment;
mod report;

pub use assessment::{Assessment, AssessmentService};
pub use report::{AssessmentReport, ContributionLine, InputLine, DISCLAIMER};
