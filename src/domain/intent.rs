use serde::{Deserialize, Serialize};

/// Which subscription-state transition a verification code authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Subscribe,
    Unsubscribe,
}

impl Intent {
    /// Wrong-code submissions tolerated before the pending verification is invalidated.
    ///
    /// Unsubscribing is the more forgiving flow: a locked-out reader keeps receiving digests.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Intent::Subscribe => 3,
            Intent::Unsubscribe => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Subscribe => "subscribe",
            Intent::Unsubscribe => "unsubscribe",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
