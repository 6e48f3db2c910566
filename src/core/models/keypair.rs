/// Armored public/private key pair as produced by key generation.
///
/// The private half is still protected by the passphrase it was
/// generated with; it only becomes usable after an unlock.
#[derive(Clone)]
pub struct ArmoredKeypair {
    public_key: String,
    private_key: String,
}

impl ArmoredKeypair {
    pub fn new(public_key: String, private_key: String) -> Self {
        Self {
            public_key,
            private_key,
        }
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn into_parts(self) -> (String, String) {
        (self.public_key, self.private_key)
    }
}

impl std::fmt::Debug for ArmoredKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmoredKeypair")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}
