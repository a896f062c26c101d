//! Questionnaire input as submitted by the assessment form.
//!
//! Form inputs arrive loosely typed: numbers may be JSON numbers or strings,
//! choices may differ in case or carry stray whitespace. Everything is decoded
//! once here into typed values so that feature construction never compares
//! raw strings. Decoding never fails; unusable values become "absent" and are
//! defaulted later by the normalizer.

use serde::{Deserialize, Deserializer, Serialize};

/// A single form value before interpretation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Number(f64),
    Flag(bool),
    Text(String),
    Empty,
    /// Arrays, objects and anything else a form input cannot produce.
    Other(serde::de::IgnoredAny),
}

impl FormValue {
    fn as_number(&self) -> Option<f64> {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            Self::Flag(_) | Self::Empty | Self::Other(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    fn into_choice(self) -> String {
        match self {
            Self::Text(s) => s.trim().to_ascii_lowercase(),
            Self::Flag(true) => "yes".to_string(),
            Self::Flag(false) => "no".to_string(),
            Self::Number(n) => n.to_string(),
            Self::Empty | Self::Other(_) => String::new(),
        }
    }

    /// Blank text, null and structured values carry no answer.
    fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Empty | Self::Other(_) => true,
            Self::Number(_) | Self::Flag(_) => false,
        }
    }

    fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(n) => Some(n.to_string()),
            Self::Flag(_) | Self::Empty | Self::Other(_) => None,
        }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<FormValue>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_number()))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<FormValue>::deserialize(deserializer)?;
    Ok(value.and_then(FormValue::into_text))
}

/// An optional choice: a blank answer is absent, anything else decodes
/// through the enum's lenient lookup.
fn lenient_choice<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<FormValue>,
{
    let value = Option::<FormValue>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_blank()).map(T::from))
}

/// Implements lenient decoding for a choice enum: a lower-cased, trimmed
/// lookup with a catch-all variant for anything unrecognised.
macro_rules! form_choice {
    ($name:ident, $fallback:ident, { $($text:literal => $variant:ident),+ $(,)? }) => {
        impl $name {
            /// Decode a raw form value.
            #[must_use]
            pub fn parse(raw: &str) -> Self {
                match raw.trim().to_ascii_lowercase().as_str() {
                    $($text => Self::$variant,)+
                    _ => Self::$fallback,
                }
            }
        }

        impl From<FormValue> for $name {
            fn from(value: FormValue) -> Self {
                Self::parse(&value.into_choice())
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::parse(s))
            }
        }
    };
}

/// A yes/no/unknown answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "FormValue")]
pub enum Answer {
    Yes,
    No,
    #[default]
    Unknown,
}

form_choice!(Answer, Unknown, { "yes" => Yes, "no" => No });

impl Answer {
    /// Only an explicit "yes" counts.
    #[must_use]
    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }

    /// Binary model encoding: yes → 1, everything else → 0.
    #[must_use]
    pub fn flag(self) -> f64 {
        if self.is_yes() {
            1.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "FormValue")]
pub enum Gender {
    Male,
    Female,
    Other,
}

form_choice!(Gender, Other, { "male" => Male, "female" => Female });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "FormValue")]
pub enum Smoking {
    Yes,
    No,
    Former,
    Unknown,
}

form_choice!(Smoking, Unknown, { "yes" => Yes, "no" => No, "former" => Former });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "FormValue")]
pub enum Alcohol {
    Never,
    Occasionally,
    Regularly,
    Unknown,
}

form_choice!(Alcohol, Unknown, {
    "never" => Never,
    "occasionally" => Occasionally,
    "regularly" => Regularly,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "FormValue")]
pub enum Diet {
    Healthy,
    Vegetarian,
    Traditional,
    Mixed,
    FastFood,
    Unrecognized,
}

form_choice!(Diet, Unrecognized, {
    "healthy" => Healthy,
    "vegetarian" => Vegetarian,
    "traditional" => Traditional,
    "mixed" => Mixed,
    "fast-food" => FastFood,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "FormValue")]
pub enum DiabetesStatus {
    Yes,
    No,
    Prediabetes,
    Unknown,
}

form_choice!(DiabetesStatus, Unknown, {
    "yes" => Yes,
    "no" => No,
    "prediabetes" => Prediabetes,
});

/// Symptom checklist. Absent entries decode to [`Answer::Unknown`].
///
/// `chest_pain`, `breathlessness` and `palpitations` are collected by the
/// form and persisted, but neither model has a term for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Symptoms {
    pub polydipsia: Answer,
    pub polyuria: Answer,
    pub sudden_weight_loss: Answer,
    pub weakness: Answer,
    pub polyphagia: Answer,
    pub genital_thrush: Answer,
    pub visual_blurring: Answer,
    pub itching: Answer,
    pub irritability: Answer,
    pub delayed_healing: Answer,
    pub partial_paresis: Answer,
    pub muscle_stiffness: Answer,
    pub alopecia: Answer,
    pub chest_pain: Answer,
    pub breathlessness: Answer,
    pub palpitations: Answer,
}

/// Raw questionnaire record.
///
/// Every field is optional at this level. The form layer is expected to
/// reject submissions without age, gender, height and weight; the scoring
/// engine still defaults age and rejects unusable height/weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAssessmentInput {
    #[serde(deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,

    #[serde(deserialize_with = "lenient_choice", skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    /// Height in centimetres.
    #[serde(deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    /// Weight in kilograms.
    #[serde(deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    #[serde(
        rename = "heartRate",
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub heart_rate: Option<f64>,

    /// "systolic/diastolic", e.g. "120/80".
    #[serde(
        rename = "bloodPressure",
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub blood_pressure: Option<String>,

    #[serde(deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub exercise_days: Option<f64>,

    #[serde(deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub sedentary_hours: Option<f64>,

    #[serde(deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub sleep: Option<f64>,

    /// Self-rated stress, 1-10.
    #[serde(deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub stress: Option<f64>,

    #[serde(deserialize_with = "lenient_choice", skip_serializing_if = "Option::is_none")]
    pub smoking: Option<Smoking>,

    #[serde(deserialize_with = "lenient_choice", skip_serializing_if = "Option::is_none")]
    pub alcohol: Option<Alcohol>,

    #[serde(deserialize_with = "lenient_choice", skip_serializing_if = "Option::is_none")]
    pub diet: Option<Diet>,

    #[serde(deserialize_with = "lenient_choice", skip_serializing_if = "Option::is_none")]
    pub diabetes_status: Option<DiabetesStatus>,

    pub family_history: Answer,
    pub previous_heart_problems: Answer,
    pub medication_use: Answer,

    #[serde(flatten)]
    pub symptoms: Symptoms,
}

impl RiskAssessmentInput {
    /// Names of the fields the form marks as required that are missing here.
    ///
    /// The form treats a zero as unanswered, and an age must be positive.
    /// Negative height or weight is left for scoring to reject.
    #[must_use]
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let answered = |v: Option<f64>| v.is_some_and(|x| x != 0.0);

        let mut missing = Vec::new();
        if !self.age.is_some_and(|age| age > 0.0) {
            missing.push("age");
        }
        if self.gender.is_none() {
            missing.push("gender");
        }
        if !answered(self.height) {
            missing.push("height");
        }
        if !answered(self.weight) {
            missing.push("weight");
        }
        missing
    }
}
