//! Assessment report: the record handed to whatever renders results.
//!
//! A report flattens an [`Assessment`] together with its category narrative
//! into a serializable structure. Page layout and PDF typesetting are left to
//! the consumer; [`AssessmentReport::render_text`] gives a plain-text summary.

use std::fmt::Write as _;

use serde::Serialize;

use super::assessment::Assessment;
use crate::domain::{BiomarkerInput, DeviationBand, Direction, RiskCategory, RiskTone};
use crate::EmraError;

/// Fixed footer shown with every result.
pub const DISCLAIMER: &str = "Percentiles are computed relative to a fixed reference \
    population used during model validation. This output reflects population-level \
    statistical patterns and is intended for research and exploratory purposes only. \
    It does not represent an individual diagnosis or prediction.";

/// One biomarker as entered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputLine {
    pub code: String,
    pub name: String,
    pub value: f64,
}

/// One row of the contribution table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionLine {
    pub code: String,
    pub name: String,
    pub z_score: f64,
    pub contribution: f64,
    /// Rounded to one decimal for display
    pub contribution_pct: f64,
    pub direction: Direction,
    pub deviation: DeviationBand,
    pub deviation_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentReport {
    pub id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub percentile: u8,
    pub category: RiskCategory,
    pub label: &'static str,
    pub icon: &'static str,
    pub tone: RiskTone,
    pub tone_color: String,
    pub interpretation: &'static str,
    pub drivers: Vec<&'static str>,
    pub why_this_matters: &'static str,
    pub inputs: Vec<InputLine>,
    pub contributions: Vec<ContributionLine>,
    pub disclaimer: &'static str,
}

fn display_name(code: &str) -> String {
    BiomarkerInput::display_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string())
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

impl AssessmentReport {
    /// Build a report. Inputs are listed in the assessment's feature order.
    #[must_use]
    pub fn from_assessment(assessment: &Assessment) -> Self {
        let narrative = assessment.category.narrative();

        let inputs = assessment
            .feature_order
            .iter()
            .filter_map(|code| {
                assessment.input.value_of(code).map(|value| InputLine {
                    code: code.clone(),
                    name: display_name(code),
                    value,
                })
            })
            .collect();

        let contributions = assessment
            .contributions
            .iter()
            .map(|c| ContributionLine {
                code: c.feature.clone(),
                name: display_name(&c.feature),
                z_score: c.z_score,
                contribution: c.contribution,
                contribution_pct: round1(c.contribution_pct),
                direction: c.direction,
                deviation: c.deviation,
                deviation_label: c.deviation_label(),
            })
            .collect();

        Self {
            id: assessment.id.clone(),
            created_at: assessment.created_at,
            percentile: assessment.percentile.value(),
            category: assessment.category,
            label: narrative.label,
            icon: narrative.icon,
            tone: narrative.tone,
            tone_color: narrative.tone.hex(),
            interpretation: narrative.interpretation,
            drivers: narrative.drivers.to_vec(),
            why_this_matters: narrative.why_this_matters,
            inputs,
            contributions,
            disclaimer: DISCLAIMER,
        }
    }

    /// Pretty-printed JSON export.
    ///
    /// # Errors
    /// Returns `Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String, EmraError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text summary of the result card and contribution analysis.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Early Metabolic Risk Assessment (Research Demo)");
        let _ = writeln!(out, "Generated: {}", self.created_at.format("%Y-%m-%d %H:%M UTC"));
        let _ = writeln!(out);
        let _ = writeln!(out, "Percentile: {}", self.percentile);
        let _ = writeln!(out, "{} {}", self.icon, self.label);
        let _ = writeln!(out, "{}", self.interpretation);
        let _ = writeln!(out);

        let _ = writeln!(out, "Input values:");
        for line in &self.inputs {
            let _ = writeln!(out, "  {:<26} {:>8.1}", line.name, line.value);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "What drives this result:");
        for driver in &self.drivers {
            let _ = writeln!(out, "  - {driver}");
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Feature contributions:");
        for c in &self.contributions {
            let _ = writeln!(
                out,
                "  {:<26} {:>5.1}%  {:<15} z={:+.2}  {}",
                c.name, c.contribution_pct, c.direction, c.z_score, c.deviation_label
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Why this signal matters:");
        let _ = writeln!(out, "{}", self.why_this_matters);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.disclaimer);

        out
    }
}
