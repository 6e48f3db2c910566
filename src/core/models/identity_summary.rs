use serde::{Deserialize, Serialize};

/// Public, shareable view of an active identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub nickname: String,
    pub email: String,
    pub fingerprint: String,
    pub public_key: String,
}

impl std::fmt::Display for IdentitySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} <{}> [{}]",
            self.nickname, self.email, self.fingerprint
        )
    }
}
