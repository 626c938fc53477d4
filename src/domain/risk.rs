//! Risk categories and their narrative content.
//!
//! The narrative for each category is static data looked up by variant; the
//! classifier itself is a pure interval test over the percentile.

use serde::{Deserialize, Serialize};

use super::percentile::Percentile;

/// Risk category derived from the calibrated percentile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    /// Percentile in [20, 30)
    LowRisk,
    /// Percentile in [30, 45)
    LowRiskWithBorderlineSignals,
    /// Percentile in [45, 60)
    BorderlineRiskPattern,
    /// Percentile in [60, 90]
    ElevatedRisk,
}

/// Visual tone shared by one or more categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTone {
    Low,
    Borderline,
    Elevated,
}

impl RiskTone {
    /// Get the associated display color (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Low => (16, 185, 129),        // Emerald (#10B981)
            Self::Borderline => (245, 158, 11), // Amber (#F59E0B)
            Self::Elevated => (239, 68, 68),    // Red (#EF4444)
        }
    }

    /// Hex form of [`RiskTone::color`].
    #[must_use]
    pub fn hex(&self) -> String {
        let (r, g, b) = self.color();
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}

/// Static narrative bundle attached to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskNarrative {
    pub label: &'static str,
    pub icon: &'static str,
    pub tone: RiskTone,
    pub interpretation: &'static str,
    pub drivers: [&'static str; 3],
    pub why_this_matters: &'static str,
}

const LOW_RISK: RiskNarrative = RiskNarrative {
    label: "Low Apparent Metabolic Risk",
    icon: "✓",
    tone: RiskTone::Low,
    interpretation: "No meaningful combined metabolic risk pattern is detected \
        based on population-level data.",
    drivers: [
        "All biomarkers fall well within typical reference ranges",
        "No clustering of borderline metabolic values",
        "Profile aligns with low-risk population patterns",
    ],
    why_this_matters: "In population-level data, profiles similar to this one are \
        predominantly observed among individuals who maintain stable \
        metabolic patterns over time.",
};

const LOW_RISK_BORDERLINE: RiskNarrative = RiskNarrative {
    label: "Low Apparent Risk (with borderline signals)",
    icon: "↗",
    tone: RiskTone::Low,
    interpretation: "Some biomarkers approach upper-normal ranges, but the overall \
        pattern remains close to population norms.",
    drivers: [
        "Isolated borderline biomarker elevation",
        "Other markers remain within expected ranges",
        "No strong interaction between multiple metabolic signals",
    ],
    why_this_matters: "Population-level analysis shows that profiles like this occupy \
        a transitional zone, where early metabolic shifts may be present \
        without triggering clinical thresholds.",
};

const BORDERLINE: RiskNarrative = RiskNarrative {
    label: "Borderline Metabolic Pattern Detected",
    icon: "⚠",
    tone: RiskTone::Borderline,
    interpretation: "Mixed metabolic signals are observed, placing this profile \
        above the population median.",
    drivers: [
        "Multiple biomarkers approach upper-normal ranges",
        "Subtle clustering across metabolic dimensions",
        "Overall pattern differs from the population center",
    ],
    why_this_matters: "In population-level cohorts, similar profiles are more frequently \
        observed among individuals who later meet criteria for metabolic \
        conditions, compared to lower-percentile groups.",
};

const ELEVATED: RiskNarrative = RiskNarrative {
    label: "Elevated Early Metabolic Risk",
    icon: "↑↑",
    tone: RiskTone::Elevated,
    interpretation: "The combined biomarker pattern shows a pronounced deviation \
        from typical population profiles, despite individual values \
        remaining near reference ranges.",
    drivers: [
        "Combined elevation of lipid and anthropometric markers",
        "Consistent upward shift across multiple biomarkers",
        "Pattern differs from the majority of the reference population",
    ],
    why_this_matters: "Population-level data indicate that profiles in this range are \
        disproportionately represented among individuals who eventually \
        exhibit clinically significant metabolic deterioration.",
};

impl RiskCategory {
    /// All categories in ascending band order.
    pub const ALL: [RiskCategory; 4] = [
        Self::LowRisk,
        Self::LowRiskWithBorderlineSignals,
        Self::BorderlineRiskPattern,
        Self::ElevatedRisk,
    ];

    /// Inclusive lower percentile bound of this category's band.
    #[must_use]
    pub fn lower_bound(&self) -> u8 {
        match self {
            Self::LowRisk => Percentile::MIN,
            Self::LowRiskWithBorderlineSignals => 30,
            Self::BorderlineRiskPattern => 45,
            Self::ElevatedRisk => 60,
        }
    }

    /// Static narrative for this category.
    #[must_use]
    pub fn narrative(&self) -> &'static RiskNarrative {
        match self {
            Self::LowRisk => &LOW_RISK,
            Self::LowRiskWithBorderlineSignals => &LOW_RISK_BORDERLINE,
            Self::BorderlineRiskPattern => &BORDERLINE,
            Self::ElevatedRisk => &ELEVATED,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.narrative().label
    }

    #[must_use]
    pub fn tone(&self) -> RiskTone {
        self.narrative().tone
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowRisk => write!(f, "LOW"),
            Self::LowRiskWithBorderlineSignals => write!(f, "LOW-BORDERLINE"),
            Self::BorderlineRiskPattern => write!(f, "BORDERLINE"),
            Self::ElevatedRisk => write!(f, "ELEVATED"),
        }
    }
}

/// Map a percentile to its risk category.
///
/// Bands are half-open with inclusive lower bounds; the last band closes at 90.
#[must_use]
pub fn classify(percentile: Percentile) -> RiskCategory {
    let p = percentile.value();
    if p < 30 {
        RiskCategory::LowRisk
    } else if p < 45 {
        RiskCategory::LowRiskWithBorderlineSignals
    } else if p < 60 {
        RiskCategory::BorderlineRiskPattern
    } else {
        RiskCategory::ElevatedRisk
    }
}
