//! Risk scoring: questionnaire in, calibrated risk out.
//!
//! Pure and stateless. The only shared state is the immutable
//! [`RiskModels`], so scoring can run on any number of threads at once.

use super::features::{normalize, CardioFeatures, DiabetesFeatures, FeatureSet};
use super::model::{evaluate_logistic_model, Condition, ModelParameters, RiskModels};
use super::questionnaire::RiskAssessmentInput;
use super::risk::{ConditionRisk, RiskResult};

/// Errors from scoring a questionnaire.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    /// Height or weight cannot produce a BMI. Aborts the whole computation.
    #[error("Invalid {field}: {reason}")]
    InvalidMeasurement { field: &'static str, reason: String },

    /// A feature vector does not fit its coefficients. Indicates a bug in
    /// feature construction, never bad user input.
    #[error("{condition} feature vector has {actual} values, model expects {expected}")]
    DimensionMismatch {
        condition: Condition,
        expected: usize,
        actual: usize,
    },
}

impl ScoringError {
    /// Whether this error is a defect rather than a rejected submission.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }
}

/// Diabetes probability (0-1).
///
/// # Errors
/// Returns `ScoringError::DimensionMismatch` if `params` is not a 16-term model.
pub fn diabetes_probability(
    features: &DiabetesFeatures,
    params: &ModelParameters,
) -> Result<f64, ScoringError> {
    evaluate_logistic_model(&features.to_vec(), params)
}

/// Cardiovascular probability (0-1).
///
/// # Errors
/// Returns `ScoringError::DimensionMismatch` if `params` is not a 21-term model.
pub fn cardiovascular_probability(
    features: &CardioFeatures,
    params: &ModelParameters,
) -> Result<f64, ScoringError> {
    evaluate_logistic_model(&features.to_vec(), params)
}

/// Score already normalized features.
///
/// # Errors
/// Returns `ScoringError::DimensionMismatch` on a vector/model mismatch.
pub fn score_features(features: &FeatureSet, models: &RiskModels) -> Result<RiskResult, ScoringError> {
    let diabetes = diabetes_probability(&features.diabetes, models.diabetes())?;
    let cvd = cardiovascular_probability(&features.cardio, models.cardiovascular())?;

    Ok(RiskResult::from_scores(
        ConditionRisk::from_probability(diabetes).score,
        ConditionRisk::from_probability(cvd).score,
    ))
}

/// Compute diabetes, cardiovascular and overall risk for a questionnaire.
///
/// # Errors
/// Returns `ScoringError::InvalidMeasurement` if height or weight is
/// unusable; every other missing or malformed answer is defaulted.
pub fn compute_risk(
    input: &RiskAssessmentInput,
    models: &RiskModels,
) -> Result<RiskResult, ScoringError> {
    let features = normalize(input, models.population())?;
    score_features(&features, models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PopulationMeans;
    use crate::domain::questionnaire::{
        Alcohol, Answer, DiabetesStatus, Diet, Gender, Smoking, Symptoms,
    };
    use crate::domain::risk::RiskLevel;

    const TOLERANCE: f64 = 1e-9;

    /// 45-year-old male, 170 cm / 90 kg, no symptoms, family history of
    /// heart disease, otherwise unremarkable lifestyle.
    fn reference_input() -> RiskAssessmentInput {
        let no = Answer::No;
        RiskAssessmentInput {
            age: Some(45.0),
            gender: Some(Gender::Male),
            height: Some(170.0),
            weight: Some(90.0),
            heart_rate: Some(72.0),
            blood_pressure: Some("120/80".to_string()),
            exercise_days: Some(3.0),
            sedentary_hours: Some(6.0),
            sleep: Some(7.0),
            stress: Some(5.0),
            smoking: Some(Smoking::No),
            alcohol: Some(Alcohol::Never),
            diet: Some(Diet::Healthy),
            diabetes_status: Some(DiabetesStatus::No),
            family_history: Answer::Yes,
            previous_heart_problems: no,
            medication_use: no,
            symptoms: Symptoms {
                polydipsia: no,
                polyuria: no,
                sudden_weight_loss: no,
                weakness: no,
                polyphagia: no,
                genital_thrush: no,
                visual_blurring: no,
                itching: no,
                irritability: no,
                delayed_healing: no,
                partial_paresis: no,
                muscle_stiffness: no,
                alopecia: no,
                chest_pain: no,
                breathlessness: no,
                palpitations: no,
            },
        }
    }

    #[test]
    fn test_reference_scenario() {
        let result = compute_risk(&reference_input(), &RiskModels::published())
            .expect("Should score");

        assert!((result.diabetes.score - 6.530600266123695).abs() < TOLERANCE);
        assert_eq!(result.diabetes.level, RiskLevel::Low);
        assert!((result.cvd.score - 25.802545498618972).abs() < TOLERANCE);
        assert_eq!(result.cvd.level, RiskLevel::Low);
        assert_eq!(result.overall.score, result.cvd.score);
        assert_eq!(result.overall.level, RiskLevel::Low);
    }

    #[test]
    fn test_reference_features() {
        let features = normalize(&reference_input(), PopulationMeans::default())
            .expect("Should normalize");

        assert!(features.body_mass.obese);
        assert!((features.body_mass.bmi - 31.141868512110726).abs() < TOLERANCE);

        let mut expected_diabetes = vec![0.0; 16];
        expected_diabetes[0] = 45.0;
        expected_diabetes[1] = 1.0;
        expected_diabetes[15] = 1.0;
        assert_eq!(features.diabetes.to_vec(), expected_diabetes);

        let cardio = features.cardio.to_vec();
        let expected_prefix = [45.0, 1.0, 262.9189189189189, 72.0, 0.0, 1.0, 0.0, 1.0, 0.0, 6.0];
        assert_eq!(&cardio[..10], &expected_prefix);
        assert_eq!(&cardio[17..], &[3.0, 7.0, 120.0, 80.0]);
    }

    #[test]
    fn test_deterministic() {
        let models = RiskModels::published();
        let input = reference_input();
        let first = compute_risk(&input, &models).expect("Should score");
        for _ in 0..10 {
            let again = compute_risk(&input, &models).expect("Should score");
            assert_eq!(again.diabetes.score.to_bits(), first.diabetes.score.to_bits());
            assert_eq!(again.cvd.score.to_bits(), first.cvd.score.to_bits());
            assert_eq!(again, first);
        }
    }

    #[test]
    fn test_blood_pressure_and_smoking_shift_cvd() {
        let input = RiskAssessmentInput {
            blood_pressure: Some("130/85".to_string()),
            smoking: Some(Smoking::Yes),
            ..reference_input()
        };
        let result = compute_risk(&input, &RiskModels::published()).expect("Should score");
        assert!((result.cvd.score - 32.12488000010772).abs() < TOLERANCE);
        assert_eq!(result.cvd.level, RiskLevel::Medium);
        assert_eq!(result.overall.level, RiskLevel::Medium);
    }

    #[test]
    fn test_symptomatic_diabetes_is_high() {
        let yes = Answer::Yes;
        let input = RiskAssessmentInput {
            age: Some(30.0),
            gender: Some(Gender::Female),
            height: Some(160.0),
            weight: Some(80.0),
            symptoms: Symptoms {
                polyuria: yes,
                polydipsia: yes,
                sudden_weight_loss: yes,
                weakness: yes,
                polyphagia: yes,
                visual_blurring: yes,
                irritability: yes,
                delayed_healing: yes,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = compute_risk(&input, &RiskModels::published()).expect("Should score");

        assert!((result.diabetes.score - 99.98856133004966).abs() < TOLERANCE);
        assert_eq!(result.diabetes.level, RiskLevel::High);
        assert_eq!(result.overall.score, result.diabetes.score);
        assert_eq!(result.overall.level, RiskLevel::High);
    }

    #[test]
    fn test_invalid_measurement_aborts() {
        let input = RiskAssessmentInput {
            weight: Some(0.0),
            ..reference_input()
        };
        let err = compute_risk(&input, &RiskModels::published()).expect_err("Should fail");
        assert!(matches!(err, ScoringError::InvalidMeasurement { field: "weight", .. }));
        assert!(!err.is_internal());
    }

    #[test]
    fn test_garbage_optional_fields_still_score() {
        let input: RiskAssessmentInput = serde_json::from_str(
            r#"{"age": 19, "gender": "female", "height": "158", "weight": "52",
                "bloodPressure": "high", "heartRate": "fast", "diet": "???",
                "smoking": "sometimes", "sleep": "lots"}"#,
        )
        .expect("Lenient decoding");
        let result = compute_risk(&input, &RiskModels::published()).expect("Should score");
        assert!((0.0..=100.0).contains(&result.overall.score));
    }

    #[test]
    fn test_mock_models() {
        let diabetes = ModelParameters::new(Condition::Diabetes, vec![0.0; 16], 0.0)
            .expect("Valid");
        let cardio = ModelParameters::new(Condition::Cardiovascular, vec![0.0; 21], 0.0)
            .expect("Valid");
        let models = RiskModels::new(diabetes, cardio, PopulationMeans::default())
            .expect("Valid");

        let result = compute_risk(&reference_input(), &models).expect("Should score");
        assert!((result.diabetes.score - 50.0).abs() < TOLERANCE);
        assert!((result.cvd.score - 50.0).abs() < TOLERANCE);
        assert_eq!(result.overall.level, RiskLevel::Medium);
    }

    #[test]
    fn test_dimension_mismatch_is_internal() {
        let features = normalize(&reference_input(), PopulationMeans::default())
            .expect("Should normalize");
        let models = RiskModels::published();
        let err = diabetes_probability(&features.diabetes, models.cardiovascular())
            .expect_err("Mismatched model must fail");
        assert!(err.is_internal());
    }
}
