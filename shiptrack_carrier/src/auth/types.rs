use std::fmt;

use shiptrack_core::Timestamp;

/// Short-lived bearer token. Upstream gives no expiry, so none is tracked.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub obtained_at: Timestamp,
}

impl Credential {
    pub fn new(token: impl Into<String>, obtained_at: Timestamp) -> Self {
        Self {
            token: token.into(),
            obtained_at,
        }
    }

    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// First and last few characters, for operator output.
    pub fn redacted_token(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &self.redacted_token())
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}
