//! Assessment records.
//!
//! A scored questionnaire as it is kept in a user's history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::questionnaire::RiskAssessmentInput;
use super::risk::RiskResult;

/// One completed assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Unique identifier
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// When the assessment was scored
    pub date: DateTime<Utc>,

    pub result: RiskResult,

    /// The questionnaire exactly as submitted
    pub input: RiskAssessmentInput,

    /// Fingerprint of the parameters that produced `result`
    pub model_fingerprint: String,
}

impl Assessment {
    /// Create a new record stamped with the current time.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        input: RiskAssessmentInput,
        result: RiskResult,
        model_fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid_v4(),
            user_id: user_id.into(),
            date: Utc::now(),
            result,
            input,
            model_fingerprint: model_fingerprint.into(),
        }
    }

    /// Override the timestamp (imports, tests).
    #[must_use]
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }
}

/// Generate a random UUID v4 from a CSPRNG seeded with OS entropy.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let mut bytes: [u8; 16] = rng.gen();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
