use secrecy::{ExposeSecret, SecretString};

use crate::core::errors::{KeysealError, Result};
use crate::core::models::envelope::Envelope;
use crate::core::models::message::{Compression, DecryptedMessage, Signing};
use crate::core::services::identity_container::IdentityContainer;
use crate::core::traits::engine::CryptoEngine;

impl<E: CryptoEngine> IdentityContainer<E> {
    /// Encrypt `plaintext` to the holder of `recipient_public_key`.
    ///
    /// With `Signing::WithOwnKey` the active identity signs the plaintext and
    /// the signature travels inside the envelope.
    pub fn encrypt_to_recipient(
        &self,
        plaintext: &[u8],
        recipient_public_key: &str,
        signing: Signing,
    ) -> Result<Envelope> {
        let active = self.require_active()?;
        let recipient = self.engine().parse_public_key(recipient_public_key)?;

        let signer = match signing {
            Signing::WithOwnKey => Some(&active.unlocked),
            Signing::None => None,
        };

        let envelope = self
            .engine()
            .encrypt_asymmetric(plaintext, &recipient, signer)?;
        tracing::debug!(
            recipient = %self.engine().fingerprint(&recipient),
            signed = signer.is_some(),
            "message encrypted"
        );
        Ok(envelope)
    }

    /// Encrypt to the active identity's own public key.
    pub fn encrypt_to_self(&self, plaintext: &[u8], signing: Signing) -> Result<Envelope> {
        let active = self.require_active()?;
        let signer = match signing {
            Signing::WithOwnKey => Some(&active.unlocked),
            Signing::None => None,
        };
        self.engine()
            .encrypt_asymmetric(plaintext, &active.public_key, signer)
    }

    /// Decrypt an envelope addressed to the active identity.
    ///
    /// When `sender_public_key` is given, the embedded signature must verify
    /// against it or the call fails with `SignatureVerificationFailed`.
    pub fn decrypt_from_sender(
        &self,
        envelope: &str,
        sender_public_key: Option<&str>,
    ) -> Result<DecryptedMessage> {
        let active = self.require_active()?;
        let verifier = sender_public_key
            .map(|armored| self.engine().parse_public_key(armored))
            .transpose()?;

        let message =
            self.engine()
                .decrypt_asymmetric(envelope, &active.unlocked, verifier.as_ref())?;
        tracing::debug!(
            verified = message.verification.is_verified(),
            bytes = message.plaintext.len(),
            "message decrypted"
        );
        Ok(message)
    }

    /// Passphrase-based, zlib-compressed encryption. Works without an
    /// active identity.
    pub fn encrypt_symmetric(
        &self,
        plaintext: &[u8],
        passphrase: &SecretString,
    ) -> Result<Envelope> {
        if passphrase.expose_secret().is_empty() {
            return Err(KeysealError::EmptyPassphrase);
        }
        self.engine()
            .encrypt_symmetric(plaintext, passphrase, Compression::Zlib)
    }

    pub fn decrypt_symmetric(&self, envelope: &str, passphrase: &SecretString) -> Result<Vec<u8>> {
        self.engine().decrypt_symmetric(envelope, passphrase)
    }
}
