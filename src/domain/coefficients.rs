//! Published logistic-regression parameters.
//!
//! These are the coefficient vectors shipped with the assessment form and
//! mirrored in `models/risk_models.json`. Order matches the feature vectors
//! built in `features.rs` position for position.

/// Diabetes coefficients (16 features).
pub const DIABETES_COEFFICIENTS: [f64; 16] = [
    -0.027407552583179968, // age
    -2.439496738939884,    // gender
    2.7010310516970915,    // polyuria
    2.826000300914173,     // polydipsia
    0.4969873293759658,    // sudden_weight_loss
    0.5041788388724303,    // weakness
    0.7603980016994618,    // polyphagia
    1.138201951970756,     // genital_thrush
    0.5454927084289005,    // visual_blurring
    -1.3798913231218795,   // itching
    1.4223032183190574,    // irritability
    -0.370054877652855,    // delayed_healing
    0.8379524923153456,    // partial_paresis
    -0.32426788965456,     // muscle_stiffness
    -0.17838670721197933,  // alopecia
    -0.18537483566280566,  // obesity
];

pub const DIABETES_INTERCEPT: f64 = 1.197076197122655;

/// Cardiovascular coefficients (21 features).
pub const CARDIO_COEFFICIENTS: [f64; 21] = [
    0.008772949594238931,   // age
    -0.14565977885497705,   // sex
    -0.0011350989383236323, // cholesterol
    -0.0159730881785711,    // heart_rate
    -0.1325709266065486,    // diabetes
    -0.313151913268581,     // family_history
    0.3805611788716861,     // smoking
    0.23811357446331025,    // obesity
    0.6861401331816692,     // alcohol
    0.04379514736589929,    // exercise_hours
    -0.3992708302094961,    // diet
    0.38469922855256716,    // previous_heart_problems
    -0.09385113690905998,   // medication_use
    0.015903444069011403,   // stress
    -0.03017000972972129,   // sedentary_hours
    0.0323790904963488,     // bmi
    0.0009333852705929462,  // triglycerides
    -0.04577299889411616,   // exercise_days
    -0.09704137341182054,   // sleep
    -0.008386850998149228,  // systolic
    0.0023050573163857857,  // diastolic
];

pub const CARDIO_INTERCEPT: f64 = 0.27405516462610224;

// === Lab-value substitutes ===
// The questionnaire never collects cholesterol or triglycerides; the
// training population means stand in for them.

/// Mean total cholesterol (mg/dL).
pub const MEAN_CHOLESTEROL: f64 = 262.9189189189189;

/// Mean triglycerides (mg/dL).
pub const MEAN_TRIGLYCERIDES: f64 = 442.60135135135135;
