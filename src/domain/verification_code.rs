use rand::Rng;
use serde::{Deserialize, Serialize};

/// A 6-digit, zero-padded numeric code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VerificationCode(String);

impl VerificationCode {
    const LENGTH: usize = 6;

    /// Draws a code uniformly from `000000`-`999999`.
    ///
    /// Re-issuing the value a reader already holds is possible and harmless: codes are single-use and
    /// expire after 15 minutes.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let value: u32 = rng.gen_range(0..1_000_000);
        Self(format!("{value:06}"))
    }

    pub fn parse(s: String) -> Result<VerificationCode, String> {
        if s.len() == Self::LENGTH && s.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(s))
        } else {
            Err(format!("{s} is not a valid verification code."))
        }
    }

    /// Compares against a code typed by a reader. Surrounding whitespace is ignored.
    pub fn matches(&self, submitted: &str) -> bool {
        self.0 == submitted.trim()
    }
}

impl AsRef<str> for VerificationCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VerificationCode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<VerificationCode> for String {
    fn from(code: VerificationCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
