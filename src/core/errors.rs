/// Errors returned by identity containers and crypto engines.
///
/// Engines translate their own failures into these variants, so no
/// `age` or `ed25519` error type crosses the public API.
#[derive(Debug, thiserror::Error)]
pub enum KeysealError {
    #[error("Key generation failed: {reason}")]
    KeyGenerationFailed { reason: String },

    #[error(
        "Decryption failed: {reason}\n\n  \
         The passphrase or key does not match this envelope, or the\n  \
         ciphertext is corrupt.\n\n  \
         Solutions:\n    \
         → Check the passphrase (it is case-sensitive)\n    \
         → Make sure the envelope was encrypted for this identity"
    )]
    DecryptionFailed { reason: String },

    #[error(
        "Malformed container: {detail}\n\n  \
         The envelope decrypted correctly but its payload is not a valid\n  \
         identity record. Expected a JSON object with 'publicKey' and 'privateKey'."
    )]
    MalformedContainer { detail: String },

    #[error("Signature verification failed: {reason}")]
    SignatureVerificationFailed { reason: String },

    #[error(
        "No active identity\n\n  \
         This operation needs an unlocked identity.\n\n  \
         Solutions:\n    \
         → Create one with originate(name, email, passphrase)\n    \
         → Or restore one with unseal(envelope, passphrase)"
    )]
    IdentityNotActive,

    #[error("Passphrase must not be empty")]
    EmptyPassphrase,

    #[error("Encryption failed: {reason}")]
    EncryptionFailed { reason: String },

    #[error("Invalid key: {detail}")]
    InvalidKey { detail: String },

    #[error(
        "Operation '{operation}' timed out\n\n  \
         The identity is unchanged unless the operation completed in the background.\n  \
         Raise [operations].timeout_secs in the config if this host is slow."
    )]
    Timeout { operation: String },

    #[error("Operation '{operation}' was cancelled before it finished")]
    Cancelled { operation: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(
        "This config uses format version {config_version}, but this build \
         only supports up to version {supported_version}."
    )]
    FormatVersionTooNew {
        config_version: u32,
        supported_version: u32,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KeysealError>;
