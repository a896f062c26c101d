//! Feature construction for the two risk models.
//!
//! Turns a questionnaire into the fixed-order numeric vectors each model
//! expects. Positions are set explicitly field by field; nothing here
//! depends on the order in which the input was decoded.

use serde::{Deserialize, Serialize};

use super::model::PopulationMeans;
use super::questionnaire::{
    Alcohol, DiabetesStatus, Diet, Gender, RiskAssessmentInput, Smoking,
};
use super::scoring::ScoringError;

/// Feature names for the diabetes model, in coefficient order.
pub const DIABETES_FEATURE_NAMES: [&str; 16] = [
    "age",
    "gender",
    "polyuria",
    "polydipsia",
    "sudden_weight_loss",
    "weakness",
    "polyphagia",
    "genital_thrush",
    "visual_blurring",
    "itching",
    "irritability",
    "delayed_healing",
    "partial_paresis",
    "muscle_stiffness",
    "alopecia",
    "obesity",
];

/// Feature names for the cardiovascular model, in coefficient order.
pub const CARDIO_FEATURE_NAMES: [&str; 21] = [
    "age",
    "sex",
    "cholesterol",
    "heart_rate",
    "diabetes",
    "family_history",
    "smoking",
    "obesity",
    "alcohol",
    "exercise_hours",
    "diet",
    "previous_heart_problems",
    "medication_use",
    "stress",
    "sedentary_hours",
    "bmi",
    "triglycerides",
    "exercise_days",
    "sleep",
    "systolic",
    "diastolic",
];

// Defaults for optional answers.
pub const DEFAULT_AGE: f64 = 40.0;
pub const DEFAULT_HEART_RATE: f64 = 80.0;
pub const DEFAULT_EXERCISE_DAYS: f64 = 3.0;
pub const DEFAULT_STRESS: f64 = 5.0;
pub const DEFAULT_SEDENTARY_HOURS: f64 = 6.0;
pub const DEFAULT_SLEEP: f64 = 7.0;

/// BMI strictly above this is obese.
pub const OBESITY_BMI_THRESHOLD: f64 = 30.0;

/// Body-mass figures derived from height and weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMass {
    pub bmi: f64,
    pub obese: bool,
}

impl BodyMass {
    /// Compute BMI from height (cm) and weight (kg).
    ///
    /// Evaluated as `kg × 10⁴ / cm²` so that exact boundary inputs
    /// (e.g. 86.7 kg at 170 cm) land exactly on 30.0.
    ///
    /// The literal `kg / (cm / 100)²` can round differently, so the
    /// cardiovascular `bmi` feature may differ from that form by at most
    /// one ULP. Only the obesity flag at an exact boundary is affected.
    ///
    /// # Errors
    /// Returns `ScoringError::InvalidMeasurement` if either value is
    /// missing, not finite, or not positive.
    pub fn from_measurements(
        height_cm: Option<f64>,
        weight_kg: Option<f64>,
    ) -> Result<Self, ScoringError> {
        let height = positive_measurement("height", height_cm)?;
        let weight = positive_measurement("weight", weight_kg)?;

        let bmi = weight * 10_000.0 / (height * height);
        if !bmi.is_finite() {
            return Err(ScoringError::InvalidMeasurement {
                field: "height",
                reason: format!("BMI is not finite for height {height} cm"),
            });
        }

        Ok(Self {
            bmi,
            obese: bmi > OBESITY_BMI_THRESHOLD,
        })
    }
}

fn positive_measurement(field: &'static str, value: Option<f64>) -> Result<f64, ScoringError> {
    match value {
        None => Err(ScoringError::InvalidMeasurement {
            field,
            reason: "missing or not a number".to_string(),
        }),
        Some(v) if !v.is_finite() || v <= 0.0 => Err(ScoringError::InvalidMeasurement {
            field,
            reason: format!("must be a positive number, got {v}"),
        }),
        Some(v) => Ok(v),
    }
}

/// A parsed "systolic/diastolic" reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

impl BloodPressure {
    pub const DEFAULT: Self = Self {
        systolic: 120.0,
        diastolic: 80.0,
    };

    /// Parse "systolic/diastolic". Anything that is not exactly two positive
    /// numbers separated by one slash yields the 120/80 default.
    #[must_use]
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or(Self::DEFAULT)
    }

    fn parse(raw: &str) -> Option<Self> {
        let (systolic, diastolic) = raw.trim().split_once('/')?;
        let systolic: f64 = systolic.trim().parse().ok()?;
        let diastolic: f64 = diastolic.trim().parse().ok()?;

        let valid = |v: f64| v.is_finite() && v > 0.0;
        (valid(systolic) && valid(diastolic)).then_some(Self {
            systolic,
            diastolic,
        })
    }
}

impl Default for BloodPressure {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn binary(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

/// Male → 1; female, other and unset → 0. The models carry a single binary
/// sex term, so "other" is indistinguishable from "female".
#[must_use]
pub fn gender_bin(gender: Option<Gender>) -> f64 {
    binary(gender == Some(Gender::Male))
}

/// Current or former smokers count.
#[must_use]
pub fn smoking_flag(smoking: Option<Smoking>) -> f64 {
    binary(matches!(smoking, Some(Smoking::Yes | Smoking::Former)))
}

/// Any answer other than "never" counts, including an unanswered question.
#[must_use]
pub fn alcohol_flag(alcohol: Option<Alcohol>) -> f64 {
    binary(alcohol != Some(Alcohol::Never))
}

/// Diagnosed or prediabetic.
#[must_use]
pub fn diabetes_flag(status: Option<DiabetesStatus>) -> f64 {
    binary(matches!(
        status,
        Some(DiabetesStatus::Yes | DiabetesStatus::Prediabetes)
    ))
}

/// Ordinal diet quality: 0 healthy, 1 average, 2 fast food.
#[must_use]
pub fn diet_ordinal(diet: Option<Diet>) -> f64 {
    match diet {
        Some(Diet::Healthy | Diet::Vegetarian) => 0.0,
        Some(Diet::FastFood) => 2.0,
        Some(Diet::Traditional | Diet::Mixed | Diet::Unrecognized) | None => 1.0,
    }
}

/// Inputs to the diabetes model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiabetesFeatures {
    pub age: f64,
    pub gender: f64,
    pub polyuria: f64,
    pub polydipsia: f64,
    pub sudden_weight_loss: f64,
    pub weakness: f64,
    pub polyphagia: f64,
    pub genital_thrush: f64,
    pub visual_blurring: f64,
    pub itching: f64,
    pub irritability: f64,
    pub delayed_healing: f64,
    pub partial_paresis: f64,
    pub muscle_stiffness: f64,
    pub alopecia: f64,
    pub obesity: f64,
}

impl DiabetesFeatures {
    /// Order matches `DIABETES_FEATURE_NAMES`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.age,
            self.gender,
            self.polyuria,
            self.polydipsia,
            self.sudden_weight_loss,
            self.weakness,
            self.polyphagia,
            self.genital_thrush,
            self.visual_blurring,
            self.itching,
            self.irritability,
            self.delayed_healing,
            self.partial_paresis,
            self.muscle_stiffness,
            self.alopecia,
            self.obesity,
        ]
    }
}

/// Inputs to the cardiovascular model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardioFeatures {
    pub age: f64,
    pub sex: f64,
    pub cholesterol: f64,
    pub heart_rate: f64,
    pub diabetes: f64,
    pub family_history: f64,
    pub smoking: f64,
    pub obesity: f64,
    pub alcohol: f64,
    pub exercise_hours: f64,
    pub diet: f64,
    pub previous_heart_problems: f64,
    pub medication_use: f64,
    pub stress: f64,
    pub sedentary_hours: f64,
    pub bmi: f64,
    pub triglycerides: f64,
    pub exercise_days: f64,
    pub sleep: f64,
    pub systolic: f64,
    pub diastolic: f64,
}

impl CardioFeatures {
    /// Order matches `CARDIO_FEATURE_NAMES`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.age,
            self.sex,
            self.cholesterol,
            self.heart_rate,
            self.diabetes,
            self.family_history,
            self.smoking,
            self.obesity,
            self.alcohol,
            self.exercise_hours,
            self.diet,
            self.previous_heart_problems,
            self.medication_use,
            self.stress,
            self.sedentary_hours,
            self.bmi,
            self.triglycerides,
            self.exercise_days,
            self.sleep,
            self.systolic,
            self.diastolic,
        ]
    }
}

/// Both feature vectors plus the shared body-mass figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub body_mass: BodyMass,
    pub blood_pressure: BloodPressure,
    pub diabetes: DiabetesFeatures,
    pub cardio: CardioFeatures,
}

/// Build both feature vectors from a questionnaire.
///
/// # Errors
/// Returns `ScoringError::InvalidMeasurement` if height or weight cannot
/// produce a BMI. Every other field is defaulted.
pub fn normalize(
    input: &RiskAssessmentInput,
    population: PopulationMeans,
) -> Result<FeatureSet, ScoringError> {
    let body_mass = BodyMass::from_measurements(input.height, input.weight)?;
    let blood_pressure = BloodPressure::parse_or_default(input.blood_pressure.as_deref());

    let age = input.age.unwrap_or(DEFAULT_AGE);
    let gender = gender_bin(input.gender);
    let obesity = binary(body_mass.obese);
    let exercise_days = input.exercise_days.unwrap_or(DEFAULT_EXERCISE_DAYS);
    let symptoms = &input.symptoms;

    let diabetes = DiabetesFeatures {
        age,
        gender,
        polyuria: symptoms.polyuria.flag(),
        polydipsia: symptoms.polydipsia.flag(),
        sudden_weight_loss: symptoms.sudden_weight_loss.flag(),
        weakness: symptoms.weakness.flag(),
        polyphagia: symptoms.polyphagia.flag(),
        genital_thrush: symptoms.genital_thrush.flag(),
        visual_blurring: symptoms.visual_blurring.flag(),
        itching: symptoms.itching.flag(),
        irritability: symptoms.irritability.flag(),
        delayed_healing: symptoms.delayed_healing.flag(),
        partial_paresis: symptoms.partial_paresis.flag(),
        muscle_stiffness: symptoms.muscle_stiffness.flag(),
        alopecia: symptoms.alopecia.flag(),
        obesity,
    };

    let cardio = CardioFeatures {
        age,
        sex: gender,
        cholesterol: population.cholesterol,
        heart_rate: input.heart_rate.unwrap_or(DEFAULT_HEART_RATE),
        diabetes: diabetes_flag(input.diabetes_status),
        family_history: input.family_history.flag(),
        smoking: smoking_flag(input.smoking),
        obesity,
        alcohol: alcohol_flag(input.alcohol),
        exercise_hours: exercise_days * 2.0,
        diet: diet_ordinal(input.diet),
        previous_heart_problems: input.previous_heart_problems.flag(),
        medication_use: input.medication_use.flag(),
        stress: input.stress.unwrap_or(DEFAULT_STRESS),
        sedentary_hours: input.sedentary_hours.unwrap_or(DEFAULT_SEDENTARY_HOURS),
        bmi: body_mass.bmi,
        triglycerides: population.triglycerides,
        exercise_days,
        sleep: input.sleep.unwrap_or(DEFAULT_SLEEP),
        systolic: blood_pressure.systolic,
        diastolic: blood_pressure.diastolic,
    };

    Ok(FeatureSet {
        body_mass,
        blood_pressure,
        diabetes,
        cardio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::questionnaire::{Answer, Symptoms};

    fn base_input() -> RiskAssessmentInput {
        RiskAssessmentInput {
            age: Some(22.0),
            gender: Some(Gender::Female),
            height: Some(165.0),
            weight: Some(60.0),
            ..Default::default()
        }
    }

    fn features(input: &RiskAssessmentInput) -> FeatureSet {
        normalize(input, PopulationMeans::default()).expect("Should normalize")
    }

    #[test]
    fn test_vector_lengths_match_names() {
        let set = features(&base_input());
        assert_eq!(set.diabetes.to_vec().len(), DIABETES_FEATURE_NAMES.len());
        assert_eq!(set.cardio.to_vec().len(), CARDIO_FEATURE_NAMES.len());
    }

    #[test]
    fn test_defaults_for_missing_optional_fields() {
        let input = RiskAssessmentInput {
            age: None,
            ..base_input()
        };
        let cardio = features(&input).cardio.to_vec();

        assert_eq!(cardio[0], DEFAULT_AGE);
        assert_eq!(cardio[3], DEFAULT_HEART_RATE);
        assert_eq!(cardio[9], DEFAULT_EXERCISE_DAYS * 2.0);
        assert_eq!(cardio[13], DEFAULT_STRESS);
        assert_eq!(cardio[14], DEFAULT_SEDENTARY_HOURS);
        assert_eq!(cardio[17], DEFAULT_EXERCISE_DAYS);
        assert_eq!(cardio[18], DEFAULT_SLEEP);
        assert_eq!((cardio[19], cardio[20]), (120.0, 80.0));
        // unanswered alcohol is not "never"
        assert_eq!(cardio[8], 1.0);
        // unanswered diet is average
        assert_eq!(cardio[10], 1.0);
    }

    #[test]
    fn test_population_means_fill_lab_values() {
        let means = PopulationMeans {
            cholesterol: 200.0,
            triglycerides: 150.0,
        };
        let set = normalize(&base_input(), means).expect("Should normalize");
        assert_eq!(set.cardio.cholesterol, 200.0);
        assert_eq!(set.cardio.triglycerides, 150.0);
    }

    #[test]
    fn test_gender_encoding_is_binary() {
        let male = features(&RiskAssessmentInput {
            gender: Some(Gender::Male),
            ..base_input()
        });
        let female = features(&RiskAssessmentInput {
            gender: Some(Gender::Female),
            ..base_input()
        });
        let other = features(&RiskAssessmentInput {
            gender: Some(Gender::Other),
            ..base_input()
        });

        assert_eq!(male.diabetes.gender, 1.0);
        assert_eq!(male.cardio.sex, 1.0);
        assert_eq!(female.diabetes.to_vec(), other.diabetes.to_vec());
        assert_eq!(female.cardio.to_vec(), other.cardio.to_vec());
        assert_eq!(female.diabetes.gender, 0.0);
    }

    #[test]
    fn test_obesity_boundary() {
        let at_boundary = BodyMass::from_measurements(Some(170.0), Some(86.7)).expect("Valid");
        assert!(at_boundary.bmi <= 30.0);
        assert!(!at_boundary.obese);

        let above = BodyMass::from_measurements(Some(170.0), Some(87.1)).expect("Valid");
        assert!((above.bmi - 30.138_408_304_498_27).abs() < 1e-9);
        assert!(above.obese);

        let set = features(&RiskAssessmentInput {
            height: Some(170.0),
            weight: Some(87.1),
            ..base_input()
        });
        assert_eq!(set.diabetes.obesity, 1.0);
        assert_eq!(set.cardio.obesity, 1.0);
        assert!((set.cardio.bmi - above.bmi).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bmi_matches_meter_form_within_one_ulp() {
        for (height, weight) in [(170.0, 86.7), (178.0, 72.0), (165.5, 58.3), (192.0, 110.0)] {
            let bmi = BodyMass::from_measurements(Some(height), Some(weight))
                .expect("Valid")
                .bmi;
            let meters = height / 100.0;
            let literal = weight / (meters * meters);
            assert!(
                (bmi - literal).abs() <= bmi * f64::EPSILON,
                "{bmi} vs {literal} for {height} cm / {weight} kg"
            );
        }
    }

    #[test]
    fn test_invalid_measurements() {
        for (height, weight, field) in [
            (None, Some(60.0), "height"),
            (Some(165.0), None, "weight"),
            (Some(0.0), Some(60.0), "height"),
            (Some(165.0), Some(-1.0), "weight"),
            (Some(f64::NAN), Some(60.0), "height"),
        ] {
            let err = BodyMass::from_measurements(height, weight).expect_err("Should fail");
            assert!(
                matches!(err, ScoringError::InvalidMeasurement { field: f, .. } if f == field),
                "unexpected error for {height:?}/{weight:?}: {err}"
            );
        }
    }

    #[test]
    fn test_blood_pressure_parsing() {
        assert_eq!(
            BloodPressure::parse_or_default(Some("130/85")),
            BloodPressure {
                systolic: 130.0,
                diastolic: 85.0
            }
        );
        assert_eq!(
            BloodPressure::parse_or_default(Some(" 110 / 70 ")),
            BloodPressure {
                systolic: 110.0,
                diastolic: 70.0
            }
        );
        for raw in [None, Some("abc"), Some("130/"), Some("/85"), Some("130/85/90"), Some("0/80"), Some("")] {
            assert_eq!(BloodPressure::parse_or_default(raw), BloodPressure::DEFAULT, "{raw:?}");
        }

        let set = features(&RiskAssessmentInput {
            blood_pressure: Some("130/85".to_string()),
            ..base_input()
        });
        assert_eq!((set.cardio.systolic, set.cardio.diastolic), (130.0, 85.0));
    }

    #[test]
    fn test_symptom_flags_only_count_yes() {
        let input = RiskAssessmentInput {
            symptoms: Symptoms {
                polyuria: Answer::Yes,
                polydipsia: Answer::No,
                itching: Answer::Unknown,
                alopecia: Answer::parse(""),
                ..Default::default()
            },
            ..base_input()
        };
        let d = features(&input).diabetes;
        assert_eq!(d.polyuria, 1.0);
        assert_eq!(d.polydipsia, 0.0);
        assert_eq!(d.itching, 0.0);
        assert_eq!(d.alopecia, 0.0);
        assert_eq!(d.weakness, 0.0);
    }

    #[test]
    fn test_categorical_encodings() {
        assert_eq!(smoking_flag(Some(Smoking::Yes)), 1.0);
        assert_eq!(smoking_flag(Some(Smoking::Former)), 1.0);
        assert_eq!(smoking_flag(Some(Smoking::No)), 0.0);
        assert_eq!(smoking_flag(None), 0.0);

        assert_eq!(alcohol_flag(Some(Alcohol::Never)), 0.0);
        assert_eq!(alcohol_flag(Some(Alcohol::Occasionally)), 1.0);
        assert_eq!(alcohol_flag(Some(Alcohol::Regularly)), 1.0);

        assert_eq!(diabetes_flag(Some(DiabetesStatus::Yes)), 1.0);
        assert_eq!(diabetes_flag(Some(DiabetesStatus::Prediabetes)), 1.0);
        assert_eq!(diabetes_flag(Some(DiabetesStatus::No)), 0.0);
        assert_eq!(diabetes_flag(None), 0.0);

        assert_eq!(diet_ordinal(Some(Diet::Healthy)), 0.0);
        assert_eq!(diet_ordinal(Some(Diet::Vegetarian)), 0.0);
        assert_eq!(diet_ordinal(Some(Diet::Traditional)), 1.0);
        assert_eq!(diet_ordinal(Some(Diet::Mixed)), 1.0);
        assert_eq!(diet_ordinal(Some(Diet::FastFood)), 2.0);
        assert_eq!(diet_ordinal(Some(Diet::Unrecognized)), 1.0);
    }

    #[test]
    fn test_vector_independent_of_json_key_order() {
        let a: RiskAssessmentInput = serde_json::from_str(
            r#"{"age": 30, "gender": "male", "height": 180, "weight": 80,
                "polyuria": "yes", "bloodPressure": "125/82", "sleep": 6}"#,
        )
        .expect("Valid");
        let b: RiskAssessmentInput = serde_json::from_str(
            r#"{"sleep": 6, "bloodPressure": "125/82", "polyuria": "yes",
                "weight": 80, "height": 180, "gender": "male", "age": 30}"#,
        )
        .expect("Valid");

        assert_eq!(features(&a), features(&b));
    }
}
