use serde::{Deserialize, Serialize};

/// Compression applied to a message body before encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Zlib,
}

/// Whether an outbound asymmetric message is signed by the sending identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signing {
    /// Sign with the container's own unlocked key.
    WithOwnKey,
    /// Encrypt only.
    None,
}

/// Outcome of the signature step of an asymmetric decryption.
///
/// A failed verification is never represented here; it is reported as
/// `KeysealError::SignatureVerificationFailed` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// No sender key was supplied. `signed` tells whether the message
    /// carried a signature at all.
    NotRequested { signed: bool },
    /// The embedded signature verified against the supplied sender key.
    Verified { signer_fingerprint: String },
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

/// Plaintext recovered from an asymmetric envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    pub plaintext: Vec<u8>,
    pub verification: Verification,
}

impl DecryptedMessage {
    /// Plaintext as UTF-8, if it is valid text.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.plaintext).ok()
    }
}
