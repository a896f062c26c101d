//! Risk result types.
//!
//! Scores are percentages in [0, 100]. A level is always derived from its
//! score with the same thresholds, for every condition and for the overall
//! figure.

use serde::{Deserialize, Serialize};

/// Scores below this are low risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 30.0;

/// Scores at or above this are high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 60.0;

/// Discrete risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Score below 30
    Low,
    /// Score from 30 up to (not including) 60
    Medium,
    /// Score of 60 or more
    High,
}

impl RiskLevel {
    /// Classify a percentage score. Boundary values belong to the higher tier.
    #[must_use]
    pub fn classify(score: f64) -> Self {
        if score < MEDIUM_RISK_THRESHOLD {
            Self::Low
        } else if score < HIGH_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - keep up your current habits",
            Self::Medium => "Medium risk - lifestyle changes recommended",
            Self::High => "High risk - please consult a healthcare provider",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            other => Err(format!("Unknown risk level: {other}")),
        }
    }
}

/// Score and level for one condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConditionRisk {
    /// Percentage, 0-100
    pub score: f64,
    pub level: RiskLevel,
}

impl ConditionRisk {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        Self {
            score,
            level: RiskLevel::classify(score),
        }
    }

    /// Convert a model probability (0-1) to a percentage risk.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        Self::from_score(probability * 100.0)
    }

    /// Score at display precision, e.g. "25.80".
    #[must_use]
    pub fn display_score(&self) -> String {
        format!("{:.2}", self.score)
    }
}

/// Overall score: the worse of the two condition scores.
#[must_use]
pub fn overall_score(diabetes: f64, cvd: f64) -> f64 {
    diabetes.max(cvd)
}

/// Complete scoring output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub diabetes: ConditionRisk,
    pub cvd: ConditionRisk,
    pub overall: ConditionRisk,
}

impl RiskResult {
    /// Assemble a result from the two condition scores.
    #[must_use]
    pub fn from_scores(diabetes_score: f64, cvd_score: f64) -> Self {
        Self {
            diabetes: ConditionRisk::from_score(diabetes_score),
            cvd: ConditionRisk::from_score(cvd_score),
            overall: ConditionRisk::from_score(overall_score(diabetes_score, cvd_score)),
        }
    }
}

impl std::fmt::Display for RiskResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "diabetes {}% ({}), cvd {}% ({}), overall {}% ({})",
            self.diabetes.display_score(),
            self.diabetes.level,
            self.cvd.display_score(),
            self.cvd.level,
            self.overall.display_score(),
            self.overall.level
        )
    }
}
