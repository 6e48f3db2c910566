use secrecy::SecretString;
use zeroize::Zeroizing;

use crate::core::errors::{KeysealError, Result};
use crate::core::models::envelope::SealedStorage;
use crate::core::models::message::Compression;
use crate::core::models::storage_record::StorageRecord;
use crate::core::services::identity_container::{ActiveIdentity, IdentityContainer, copy_secret};
use crate::core::traits::engine::CryptoEngine;

impl<E: CryptoEngine> IdentityContainer<E> {
    /// Encrypt the identity's key pair into a storage envelope under its
    /// own passphrase, with zlib compression.
    pub fn seal(&self) -> Result<SealedStorage> {
        let active = self.require_active()?;

        let record = StorageRecord {
            public_key: active.public_key_armored.clone(),
            private_key: active.private_key_armored.clone(),
        };
        let json = Zeroizing::new(record.to_json()?);

        let envelope =
            self.engine()
                .encrypt_symmetric(json.as_bytes(), &active.passphrase, Compression::Zlib)?;

        tracing::debug!(
            fingerprint = %active.fingerprint,
            bytes = envelope.as_str().len(),
            "identity sealed"
        );
        Ok(SealedStorage::new(envelope))
    }

    /// Seal the identity and return only the `data:` URI form.
    pub fn generate_secure_file(&self) -> Result<String> {
        Ok(self.seal()?.download_uri)
    }

    /// Restore an identity from a storage envelope.
    ///
    /// All-or-nothing: decrypt, validate the payload, parse and unlock the
    /// keys, and only then replace the current state. Any failure leaves the
    /// container untouched.
    pub fn unseal(&mut self, envelope: &str, passphrase: &SecretString) -> Result<()> {
        let state = self.prepare_unseal(envelope, passphrase)?;
        self.bind(state, "identity restored from envelope");
        Ok(())
    }

    pub(super) fn prepare_unseal(
        &self,
        envelope: &str,
        passphrase: &SecretString,
    ) -> Result<ActiveIdentity<E>> {
        let payload = Zeroizing::new(self.engine().decrypt_symmetric(envelope, passphrase)?);

        let text = std::str::from_utf8(&payload).map_err(|_| KeysealError::MalformedContainer {
            detail: "payload is not valid UTF-8".into(),
        })?;
        let record = StorageRecord::from_json(text)?;

        self.derive_active(record.public_key, record.private_key, copy_secret(passphrase))
    }

    /// Structural check that `candidate` is an envelope, without decrypting it.
    pub fn validate_envelope(&self, candidate: &str) -> bool {
        match self.engine().parse_message(candidate) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "envelope rejected");
                false
            }
        }
    }
}
