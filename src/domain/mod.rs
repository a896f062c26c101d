//! Domain layer: questionnaire, feature construction and scoring.
//!
//! Pure Rust with no I/O beyond loading a parameter file. Everything here
//! is deterministic and safe to share across threads.

mod assessment;
pub mod coefficients;
pub mod features;
pub mod model;
pub mod questionnaire;
mod risk;
mod scoring;

pub use assessment::Assessment;
pub use features::{normalize, BloodPressure, BodyMass, CardioFeatures, DiabetesFeatures, FeatureSet};
pub use model::{
    evaluate_logistic_model, sigmoid, Condition, ExportedModel, ExportedRiskModels, ModelError,
    ModelParameters, PopulationMeans, RiskModels,
};
pub use questionnaire::{
    Alcohol, Answer, DiabetesStatus, Diet, Gender, RiskAssessmentInput, Smoking, Symptoms,
};
pub use risk::{
    overall_score, ConditionRisk, RiskLevel, RiskResult, HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD,
};
pub use scoring::{
    cardiovascular_probability, compute_risk, diabetes_probability, score_features, ScoringError,
};
