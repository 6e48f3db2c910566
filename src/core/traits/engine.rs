use secrecy::SecretString;

use crate::core::errors::Result;
use crate::core::models::envelope::Envelope;
use crate::core::models::keypair::ArmoredKeypair;
use crate::core::models::message::{Compression, DecryptedMessage};
use crate::core::models::user_id::UserId;

/// Port for the cryptographic engine.
///
/// Implementations live in `adapters::engine` (e.g. AgeEngine).
/// The core layer only depends on this trait, never on a concrete engine.
/// Every method translates engine-internal failures into `KeysealError`.
pub trait CryptoEngine: Send + Sync {
    /// Parsed public key, safe to share.
    type PublicKey: Clone + Send + Sync + 'static;
    /// Parsed private key, still locked by its passphrase.
    type PrivateKey: Send + Sync + 'static;
    /// Operation-ready private key.
    type UnlockedKey: Send + Sync + 'static;

    /// Generate a fresh curve25519 keypair bound to `user_id`, with the
    /// private half protected by `passphrase`.
    fn generate_keypair(&self, user_id: &UserId, passphrase: &SecretString)
    -> Result<ArmoredKeypair>;

    fn parse_public_key(&self, armored: &str) -> Result<Self::PublicKey>;

    fn parse_private_key(&self, armored: &str) -> Result<Self::PrivateKey>;

    /// Unlock a parsed private key. A wrong passphrase is a `DecryptionFailed`.
    fn unlock_private_key(
        &self,
        key: &Self::PrivateKey,
        passphrase: &SecretString,
    ) -> Result<Self::UnlockedKey>;

    /// True if `unlocked` is the private half of `public`.
    fn key_matches(&self, public: &Self::PublicKey, unlocked: &Self::UnlockedKey) -> bool;

    /// Canonical fingerprint of a public key.
    fn fingerprint(&self, key: &Self::PublicKey) -> String;

    fn primary_user_id(&self, key: &Self::PublicKey) -> Result<UserId>;

    /// Encrypt to `recipient`, signing with `signer` when one is given.
    fn encrypt_asymmetric(
        &self,
        plaintext: &[u8],
        recipient: &Self::PublicKey,
        signer: Option<&Self::UnlockedKey>,
    ) -> Result<Envelope>;

    /// Decrypt with `key`. When `verifier` is given the first embedded
    /// signature must verify against it.
    fn decrypt_asymmetric(
        &self,
        ciphertext: &str,
        key: &Self::UnlockedKey,
        verifier: Option<&Self::PublicKey>,
    ) -> Result<DecryptedMessage>;

    fn encrypt_symmetric(
        &self,
        plaintext: &[u8],
        passphrase: &SecretString,
        compression: Compression,
    ) -> Result<Envelope>;

    fn decrypt_symmetric(&self, ciphertext: &str, passphrase: &SecretString) -> Result<Vec<u8>>;

    /// Structural check of an envelope, without decrypting it.
    fn parse_message(&self, candidate: &str) -> Result<()>;

    /// Human-readable name of this engine (e.g. "age").
    fn name(&self) -> &str;
}
