//! Biomarker input types for early metabolic risk assessment.
//!
//! Based on NHANES (CDC National Health and Nutrition Examination Survey) laboratory
//! and examination codes.

use serde::{Deserialize, Serialize};

/// NHANES code for fasting plasma glucose (mg/dL).
pub const GLUCOSE_CODE: &str = "LBXGLU";
/// NHANES code for glycohemoglobin HbA1c (%).
pub const HBA1C_CODE: &str = "LBXGH";
/// NHANES code for triglycerides (mg/dL).
pub const TRIGLYCERIDES_CODE: &str = "LBXTR";
/// NHANES code for body-mass index (kg/m²).
pub const BMI_CODE: &str = "BMXBMI";

/// Model codes in the order the reference model was trained on.
///
/// Only used to build fixtures and defaults; at runtime the metadata
/// artifact declares the order.
pub const FEATURE_CODES: [&str; 4] = [GLUCOSE_CODE, HBA1C_CODE, TRIGLYCERIDES_CODE, BMI_CODE];

/// Four biomarker measurements collected by the input form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerInput {
    /// Fasting glucose in mg/dL (LBXGLU, form range 50-200)
    pub fasting_glucose: f64,

    /// Glycohemoglobin in % (LBXGH, form range 4-10)
    pub hba1c: f64,

    /// Triglycerides in mg/dL (LBXTR, form range 50-400)
    pub triglycerides: f64,

    /// Body-mass index (BMXBMI, form range 15-45)
    pub bmi: f64,
}

impl Default for BiomarkerInput {
    /// The form's initial values.
    fn default() -> Self {
        Self {
            fasting_glucose: 90.0,
            hba1c: 5.4,
            triglycerides: 120.0,
            bmi: 24.0,
        }
    }
}

impl BiomarkerInput {
    /// Create a new input from the four measurements.
    #[must_use]
    pub fn new(fasting_glucose: f64, hba1c: f64, triglycerides: f64, bmi: f64) -> Self {
        Self {
            fasting_glucose,
            hba1c,
            triglycerides,
            bmi,
        }
    }

    /// Look up a measurement by its model code.
    #[must_use]
    pub fn value_of(&self, code: &str) -> Option<f64> {
        match code {
            GLUCOSE_CODE => Some(self.fasting_glucose),
            HBA1C_CODE => Some(self.hba1c),
            TRIGLYCERIDES_CODE => Some(self.triglycerides),
            BMI_CODE => Some(self.bmi),
            _ => None,
        }
    }

    /// Human-readable name and unit for a model code.
    #[must_use]
    pub fn display_name(code: &str) -> Option<&'static str> {
        match code {
            GLUCOSE_CODE => Some("Fasting glucose (mg/dL)"),
            HBA1C_CODE => Some("HbA1c (%)"),
            TRIGLYCERIDES_CODE => Some("Triglycerides (mg/dL)"),
            BMI_CODE => Some("Body Mass Index (BMI)"),
            _ => None,
        }
    }

    /// Assemble a feature vector in the given code order.
    ///
    /// # Errors
    /// Returns the first code this input has no measurement for.
    pub fn to_ordered_vec<S: AsRef<str>>(&self, codes: &[S]) -> Result<Vec<f64>, String> {
        codes
            .iter()
            .map(|code| {
                let code = code.as_ref();
                self.value_of(code)
                    .ok_or_else(|| format!("Unknown biomarker code {code}"))
            })
            .collect()
    }

    /// Validate that all measurements fall inside the input form ranges.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let checks = [
            ("Fasting glucose", self.fasting_glucose, 50.0, 200.0),
            ("HbA1c", self.hba1c, 4.0, 10.0),
            ("Triglycerides", self.triglycerides, 50.0, 400.0),
            ("BMI", self.bmi, 15.0, 45.0),
        ];

        let errors: Vec<String> = checks
            .iter()
            .filter(|(_, value, lo, hi)| !(*lo..=*hi).contains(value))
            .map(|(name, value, lo, hi)| format!("{name} {value} out of range [{lo}, {hi}]"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
