//! Logistic-regression parameters and evaluation.
//!
//! Parameters are immutable value objects built once at startup, either from
//! the published constants or from a JSON parameter file, and passed
//! explicitly to the scorer. Evaluation is a dot product plus sigmoid and is
//! shared by both conditions.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::coefficients::{
    CARDIO_COEFFICIENTS, CARDIO_INTERCEPT, DIABETES_COEFFICIENTS, DIABETES_INTERCEPT,
    MEAN_CHOLESTEROL, MEAN_TRIGLYCERIDES,
};
use super::features::{CARDIO_FEATURE_NAMES, DIABETES_FEATURE_NAMES};
use super::scoring::ScoringError;

/// Errors while loading model parameters.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model file format: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model parameters: {0}")]
    Invalid(String),
}

/// The conditions the engine scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Diabetes,
    Cardiovascular,
}

impl Condition {
    /// Canonical feature order for this condition's model.
    #[must_use]
    pub fn feature_names(self) -> &'static [&'static str] {
        match self {
            Self::Diabetes => &DIABETES_FEATURE_NAMES,
            Self::Cardiovascular => &CARDIO_FEATURE_NAMES,
        }
    }

    #[must_use]
    pub fn feature_count(self) -> usize {
        self.feature_names().len()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diabetes => write!(f, "diabetes"),
            Self::Cardiovascular => write!(f, "cardiovascular"),
        }
    }
}

/// Logistic sigmoid, `1 / (1 + e^-z)`.
#[must_use]
pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Coefficients and intercept for one condition.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParameters {
    condition: Condition,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl ModelParameters {
    /// Create validated parameters for a condition.
    ///
    /// # Errors
    /// Returns `ModelError::Invalid` if the coefficient count does not match
    /// the condition's feature vector or any value is not finite.
    pub fn new(
        condition: Condition,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> Result<Self, ModelError> {
        let expected = condition.feature_count();
        if coefficients.len() != expected {
            return Err(ModelError::Invalid(format!(
                "{condition} model has {} coefficients, expected {expected}",
                coefficients.len()
            )));
        }
        if let Some(i) = coefficients.iter().position(|c| !c.is_finite()) {
            return Err(ModelError::Invalid(format!(
                "{condition} coefficient {i} ({}) is not finite",
                condition.feature_names()[i]
            )));
        }
        if !intercept.is_finite() {
            return Err(ModelError::Invalid(format!(
                "{condition} intercept is not finite"
            )));
        }

        Ok(Self {
            condition,
            coefficients,
            intercept,
        })
    }

    #[must_use]
    pub fn condition(&self) -> Condition {
        self.condition
    }

    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// `intercept + Σ coefficient[i] × feature[i]`, accumulated left to right.
    ///
    /// # Errors
    /// Returns `ScoringError::DimensionMismatch` if the vector length differs
    /// from the coefficient count.
    pub fn linear_predictor(&self, features: &[f64]) -> Result<f64, ScoringError> {
        if features.len() != self.coefficients.len() {
            return Err(ScoringError::DimensionMismatch {
                condition: self.condition,
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }

        Ok(self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |z, (coef, x)| z + coef * x))
    }
}

/// Evaluate a logistic model, returning a probability in (0, 1).
///
/// # Errors
/// Returns `ScoringError::DimensionMismatch` on a length mismatch.
pub fn evaluate_logistic_model(
    features: &[f64],
    params: &ModelParameters,
) -> Result<f64, ScoringError> {
    params.linear_predictor(features).map(sigmoid)
}

/// Population means substituted for lab values the questionnaire never asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationMeans {
    pub cholesterol: f64,
    pub triglycerides: f64,
}

impl Default for PopulationMeans {
    fn default() -> Self {
        Self {
            cholesterol: MEAN_CHOLESTEROL,
            triglycerides: MEAN_TRIGLYCERIDES,
        }
    }
}

/// One model as stored in a parameter file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedModel {
    /// Optional; when present it must match the canonical order exactly.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Parameter file layout (`models/risk_models.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedRiskModels {
    pub diabetes: ExportedModel,
    pub cardiovascular: ExportedModel,
    #[serde(default = "default_mean_cholesterol")]
    pub mean_cholesterol: f64,
    #[serde(default = "default_mean_triglycerides")]
    pub mean_triglycerides: f64,
}

fn default_mean_cholesterol() -> f64 {
    MEAN_CHOLESTEROL
}

fn default_mean_triglycerides() -> f64 {
    MEAN_TRIGLYCERIDES
}

impl ExportedModel {
    fn into_parameters(self, condition: Condition) -> Result<ModelParameters, ModelError> {
        if !self.feature_names.is_empty() {
            let canonical = condition.feature_names();
            let matches = self.feature_names.len() == canonical.len()
                && self
                    .feature_names
                    .iter()
                    .zip(canonical)
                    .all(|(given, expected)| given == expected);
            if !matches {
                return Err(ModelError::Invalid(format!(
                    "{condition} feature_names do not match the expected order: {canonical:?}"
                )));
            }
        }
        ModelParameters::new(condition, self.coefficients, self.intercept)
    }

    fn from_parameters(params: &ModelParameters) -> Self {
        Self {
            feature_names: params
                .condition
                .feature_names()
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            coefficients: params.coefficients.clone(),
            intercept: params.intercept,
        }
    }
}

/// The full, immutable parameter set used by the scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskModels {
    diabetes: ModelParameters,
    cardiovascular: ModelParameters,
    population: PopulationMeans,
    fingerprint: String,
}

impl RiskModels {
    /// Build a parameter set from already validated parts.
    ///
    /// # Errors
    /// Returns `ModelError::Invalid` if the parameters are attached to the
    /// wrong condition or a population mean is not a positive finite number.
    pub fn new(
        diabetes: ModelParameters,
        cardiovascular: ModelParameters,
        population: PopulationMeans,
    ) -> Result<Self, ModelError> {
        if diabetes.condition != Condition::Diabetes
            || cardiovascular.condition != Condition::Cardiovascular
        {
            return Err(ModelError::Invalid(
                "model parameters attached to the wrong condition".into(),
            ));
        }
        for (name, value) in [
            ("mean_cholesterol", population.cholesterol),
            ("mean_triglycerides", population.triglycerides),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ModelError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        Ok(Self::assemble(diabetes, cardiovascular, population))
    }

    fn assemble(
        diabetes: ModelParameters,
        cardiovascular: ModelParameters,
        population: PopulationMeans,
    ) -> Self {
        let fingerprint = fingerprint_of(&diabetes, &cardiovascular, &population);
        Self {
            diabetes,
            cardiovascular,
            population,
            fingerprint,
        }
    }

    /// The published coefficients compiled into the binary.
    #[must_use]
    pub fn published() -> Self {
        Self::assemble(
            ModelParameters {
                condition: Condition::Diabetes,
                coefficients: DIABETES_COEFFICIENTS.to_vec(),
                intercept: DIABETES_INTERCEPT,
            },
            ModelParameters {
                condition: Condition::Cardiovascular,
                coefficients: CARDIO_COEFFICIENTS.to_vec(),
                intercept: CARDIO_INTERCEPT,
            },
            PopulationMeans::default(),
        )
    }

    /// Parse and validate a JSON parameter document.
    ///
    /// # Errors
    /// Returns `ModelError::Parse` for malformed JSON and
    /// `ModelError::Invalid` for parameters that fail validation.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let exported: ExportedRiskModels = serde_json::from_str(json)?;
        Self::from_exported(exported)
    }

    /// Validate an exported parameter document.
    ///
    /// # Errors
    /// Returns `ModelError::Invalid` if any part fails validation.
    pub fn from_exported(exported: ExportedRiskModels) -> Result<Self, ModelError> {
        let diabetes = exported.diabetes.into_parameters(Condition::Diabetes)?;
        let cardiovascular = exported
            .cardiovascular
            .into_parameters(Condition::Cardiovascular)?;
        Self::new(
            diabetes,
            cardiovascular,
            PopulationMeans {
                cholesterol: exported.mean_cholesterol,
                triglycerides: exported.mean_triglycerides,
            },
        )
    }

    /// Load parameters from a JSON file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or fails validation.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        let models = Self::from_json(&content)?;

        tracing::info!(
            "Loaded risk models from {:?} (fingerprint={})",
            path,
            models.fingerprint_short()
        );
        Ok(models)
    }

    #[must_use]
    pub fn diabetes(&self) -> &ModelParameters {
        &self.diabetes
    }

    #[must_use]
    pub fn cardiovascular(&self) -> &ModelParameters {
        &self.cardiovascular
    }

    #[must_use]
    pub fn population(&self) -> PopulationMeans {
        self.population
    }

    /// SHA-256 over every parameter, hex encoded.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// First 12 hex digits of the fingerprint, for logs.
    #[must_use]
    pub fn fingerprint_short(&self) -> &str {
        &self.fingerprint[..12]
    }

    #[must_use]
    pub fn to_exported(&self) -> ExportedRiskModels {
        ExportedRiskModels {
            diabetes: ExportedModel::from_parameters(&self.diabetes),
            cardiovascular: ExportedModel::from_parameters(&self.cardiovascular),
            mean_cholesterol: self.population.cholesterol,
            mean_triglycerides: self.population.triglycerides,
        }
    }

    /// Pretty-printed JSON in the parameter file layout.
    ///
    /// # Errors
    /// Returns `ModelError::Parse` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(&self.to_exported())?)
    }
}

impl Default for RiskModels {
    fn default() -> Self {
        Self::published()
    }
}

fn fingerprint_of(
    diabetes: &ModelParameters,
    cardiovascular: &ModelParameters,
    population: &PopulationMeans,
) -> String {
    let mut hasher = Sha256::new();
    for params in [diabetes, cardiovascular] {
        hasher.update(params.condition.to_string().as_bytes());
        hasher.update((params.coefficients.len() as u64).to_le_bytes());
        for c in &params.coefficients {
            hasher.update(c.to_le_bytes());
        }
        hasher.update(params.intercept.to_le_bytes());
    }
    hasher.update(population.cholesterol.to_le_bytes());
    hasher.update(population.triglycerides.to_le_bytes());

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
