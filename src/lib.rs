//! # HealthGuard
//!
//! Diabetes and cardiovascular risk scoring for health self-assessments.
//!
//! A questionnaire is normalized into two fixed-order feature vectors, each
//! scored by a published logistic-regression model. The two percentages are
//! classified into Low/Medium/High, and the overall risk is the worse of
//! the two.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Questionnaire, features, model parameters and scoring
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (SQLite, log redaction)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{compute_risk, RiskAssessmentInput, RiskLevel, RiskModels, RiskResult};

/// Result type for HealthGuard operations
pub type Result<T> = std::result::Result<T, HealthGuardError>;

/// Main error type for HealthGuard
#[derive(Debug, thiserror::Error)]
pub enum HealthGuardError {
    #[error("Scoring failed: {0}")]
    Scoring(#[from] domain::ScoringError),

    #[error("Model parameters rejected: {0}")]
    Model(#[from] domain::ModelError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Invalid assessment: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
