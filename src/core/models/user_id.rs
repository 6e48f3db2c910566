use serde::{Deserialize, Serialize};

/// Primary identifier bound into a public key: a display name plus email.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId {
    pub name: String,
    pub email: String,
}

impl UserId {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// True when either half is empty. Such ids would produce an identity
    /// that can never pass the integrity check.
    pub fn is_incomplete(&self) -> bool {
        self.name.is_empty() || self.email.is_empty()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}
