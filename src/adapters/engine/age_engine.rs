use std::io::{Read, Write};

use ed25519_dalek::{Signature, SigningKey};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use super::frame::{self, FrameSignature};
use super::key_material::{
    AgePrivateKey, AgePublicKey, AgeUnlockedKey, KEY_VERSION, PrivateKeyRecord, PublicKeyRecord,
    SecretKeyRecord,
};
use crate::config::app_config::{AppConfig, EngineConfig};
use crate::core::errors::{KeysealError, Result};
use crate::core::models::envelope::Envelope;
use crate::core::models::keypair::ArmoredKeypair;
use crate::core::models::message::{Compression, DecryptedMessage, Verification};
use crate::core::models::user_id::UserId;
use crate::core::traits::engine::CryptoEngine;

/// Engine built on age (X25519 + ChaCha20-Poly1305, scrypt for passphrases)
/// with Ed25519 signatures.
///
/// Uses ASCII-armored output so envelopes are text-friendly and can be
/// embedded in JSON, data URIs or Git.
pub struct AgeEngine {
    config: EngineConfig,
}

impl AgeEngine {
    /// Build an engine, rejecting limits it could not honour, such as a
    /// `max_work_factor` below the factor it seals with.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.engine.clone())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn scrypt_recipient(&self, passphrase: &SecretString) -> age::scrypt::Recipient {
        let mut recipient =
            age::scrypt::Recipient::new(SecretString::from(passphrase.expose_secret().to_owned()));
        recipient.set_work_factor(self.config.scrypt_work_factor);
        recipient
    }

    fn scrypt_identity(&self, passphrase: &SecretString) -> age::scrypt::Identity {
        let mut identity =
            age::scrypt::Identity::new(SecretString::from(passphrase.expose_secret().to_owned()));
        identity.set_max_work_factor(self.config.max_work_factor);
        identity
    }

    /// Encrypt `payload` to a single age recipient with ASCII armor.
    fn seal_to(&self, recipient: &dyn age::Recipient, payload: &[u8]) -> Result<Envelope> {
        let encryptor = age::Encryptor::with_recipients(std::iter::once(recipient))
            .map_err(|e| KeysealError::EncryptionFailed {
                reason: format!("{e}"),
            })?;

        let mut output = Vec::new();
        let armored =
            age::armor::ArmoredWriter::wrap_output(&mut output, age::armor::Format::AsciiArmor)
                .map_err(|e| KeysealError::EncryptionFailed {
                    reason: format!("Armor writer failed: {e}"),
                })?;

        let mut writer =
            encryptor
                .wrap_output(armored)
                .map_err(|e| KeysealError::EncryptionFailed {
                    reason: format!("Encryption stream failed: {e}"),
                })?;

        writer
            .write_all(payload)
            .map_err(|e| KeysealError::EncryptionFailed {
                reason: format!("Write failed: {e}"),
            })?;

        let armored_writer = writer
            .finish()
            .map_err(|e| KeysealError::EncryptionFailed {
                reason: format!("Encryption finish failed: {e}"),
            })?;

        armored_writer
            .finish()
            .map_err(|e| KeysealError::EncryptionFailed {
                reason: format!("Armor finish failed: {e}"),
            })?;

        let armored = String::from_utf8(output).map_err(|_| KeysealError::EncryptionFailed {
            reason: "armored output is not UTF-8".into(),
        })?;
        Ok(Envelope::new(armored))
    }

    /// Decrypt an armored envelope with `identity`.
    ///
    /// `passphrase_mode` is the kind of envelope the caller expects. A
    /// mismatch is a decryption failure.
    fn open(
        &self,
        ciphertext: &str,
        identity: &dyn age::Identity,
        passphrase_mode: bool,
    ) -> Result<Vec<u8>> {
        let armored_reader = age::armor::ArmoredReader::new(ciphertext.as_bytes());
        let decryptor =
            age::Decryptor::new(armored_reader).map_err(|e| KeysealError::DecryptionFailed {
                reason: format!("Invalid envelope: {e}"),
            })?;

        if decryptor.is_scrypt() != passphrase_mode {
            return Err(KeysealError::DecryptionFailed {
                reason: if passphrase_mode {
                    "envelope is addressed to a key, not a passphrase".into()
                } else {
                    "envelope is passphrase-encrypted, not addressed to a key".into()
                },
            });
        }

        let mut reader = decryptor
            .decrypt(std::iter::once(identity))
            .map_err(|e| KeysealError::DecryptionFailed {
                reason: format!("{e}"),
            })?;

        let mut plaintext = Vec::new();
        reader
            .read_to_end(&mut plaintext)
            .map_err(|e| KeysealError::DecryptionFailed {
                reason: format!("Read decrypted data failed: {e}"),
            })?;

        Ok(plaintext)
    }

    fn verify(
        &self,
        plaintext: &[u8],
        signature: Option<&FrameSignature>,
        verifier: &AgePublicKey,
    ) -> Result<Verification> {
        let signature = signature.ok_or_else(|| KeysealError::SignatureVerificationFailed {
            reason: "message is not signed".into(),
        })?;

        if &signature.signer != verifier.fingerprint.as_bytes() {
            return Err(KeysealError::SignatureVerificationFailed {
                reason: format!(
                    "signed by {}, expected {}",
                    hex::encode_upper(signature.signer),
                    verifier.fingerprint.to_hex()
                ),
            });
        }

        verifier
            .verifying_key
            .verify_strict(plaintext, &Signature::from_bytes(&signature.signature))
            .map_err(|_| KeysealError::SignatureVerificationFailed {
                reason: "signature does not match message".into(),
            })?;

        Ok(Verification::Verified {
            signer_fingerprint: verifier.fingerprint.to_hex(),
        })
    }
}

impl Default for AgeEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }
}

impl CryptoEngine for AgeEngine {
    type PublicKey = AgePublicKey;
    type PrivateKey = AgePrivateKey;
    type UnlockedKey = AgeUnlockedKey;

    fn generate_keypair(
        &self,
        user_id: &UserId,
        passphrase: &SecretString,
    ) -> Result<ArmoredKeypair> {
        let identity = age::x25519::Identity::generate();
        let signing_key = SigningKey::generate(&mut OsRng);
        let created = chrono::Utc::now().timestamp();

        let public =
            PublicKeyRecord::certify(created, user_id, &identity.to_public(), &signing_key)?;

        let secret = SecretKeyRecord::new(created, &identity, &signing_key);
        let secret_json = Zeroizing::new(serde_json::to_vec(&secret).map_err(|e| {
            KeysealError::KeyGenerationFailed {
                reason: format!("could not encode secret key: {e}"),
            }
        })?);
        let sealed = self
            .encrypt_symmetric(&secret_json, passphrase, Compression::None)
            .map_err(|e| KeysealError::KeyGenerationFailed {
                reason: format!("could not protect private key: {e}"),
            })?;

        let unlocked = AgeUnlockedKey::from_secret(&secret)?;
        let private = PrivateKeyRecord {
            version: KEY_VERSION,
            fingerprint: unlocked.fingerprint.to_hex(),
            sealed: sealed.into_string(),
        };

        tracing::debug!(
            fingerprint = %unlocked.fingerprint.to_hex(),
            "generated curve25519 keypair"
        );
        Ok(ArmoredKeypair::new(public.to_armored()?, private.to_armored()?))
    }

    fn parse_public_key(&self, armored: &str) -> Result<AgePublicKey> {
        PublicKeyRecord::from_armored(armored)?.into_key()
    }

    fn parse_private_key(&self, armored: &str) -> Result<AgePrivateKey> {
        PrivateKeyRecord::from_armored(armored)
    }

    fn unlock_private_key(
        &self,
        key: &AgePrivateKey,
        passphrase: &SecretString,
    ) -> Result<AgeUnlockedKey> {
        let plaintext = Zeroizing::new(self.decrypt_symmetric(&key.sealed, passphrase)?);
        let secret: SecretKeyRecord =
            serde_json::from_slice(&plaintext).map_err(|e| KeysealError::InvalidKey {
                detail: format!("invalid secret key record: {e}"),
            })?;
        let unlocked = AgeUnlockedKey::from_secret(&secret)?;

        if unlocked.fingerprint.to_hex() != key.fingerprint {
            return Err(KeysealError::InvalidKey {
                detail: "unlocked key does not match its recorded fingerprint".into(),
            });
        }
        Ok(unlocked)
    }

    fn key_matches(&self, public: &AgePublicKey, unlocked: &AgeUnlockedKey) -> bool {
        public.fingerprint == unlocked.fingerprint
    }

    fn fingerprint(&self, key: &AgePublicKey) -> String {
        key.fingerprint.to_hex()
    }

    fn primary_user_id(&self, key: &AgePublicKey) -> Result<UserId> {
        Ok(key.user_id.clone())
    }

    fn encrypt_asymmetric(
        &self,
        plaintext: &[u8],
        recipient: &AgePublicKey,
        signer: Option<&AgeUnlockedKey>,
    ) -> Result<Envelope> {
        let signature = signer.map(|key| FrameSignature {
            signer: *key.fingerprint.as_bytes(),
            signature: key.sign(plaintext).to_bytes(),
        });
        let payload = Zeroizing::new(frame::encode(
            plaintext,
            Compression::None,
            self.config.compression_level,
            signature.as_ref(),
        )?);
        self.seal_to(&recipient.recipient, &payload)
    }

    fn decrypt_asymmetric(
        &self,
        ciphertext: &str,
        key: &AgeUnlockedKey,
        verifier: Option<&AgePublicKey>,
    ) -> Result<DecryptedMessage> {
        let payload = Zeroizing::new(self.open(ciphertext, &key.identity, false)?);
        let frame = frame::decode(&payload, self.config.max_message_size)?;

        let verification = match verifier {
            Some(public) => self.verify(&frame.plaintext, frame.signature.as_ref(), public)?,
            None => Verification::NotRequested {
                signed: frame.signature.is_some(),
            },
        };

        Ok(DecryptedMessage {
            plaintext: frame.plaintext,
            verification,
        })
    }

    fn encrypt_symmetric(
        &self,
        plaintext: &[u8],
        passphrase: &SecretString,
        compression: Compression,
    ) -> Result<Envelope> {
        if passphrase.expose_secret().is_empty() {
            return Err(KeysealError::EmptyPassphrase);
        }
        let payload = Zeroizing::new(frame::encode(
            plaintext,
            compression,
            self.config.compression_level,
            None,
        )?);
        self.seal_to(&self.scrypt_recipient(passphrase), &payload)
    }

    fn decrypt_symmetric(&self, ciphertext: &str, passphrase: &SecretString) -> Result<Vec<u8>> {
        let identity = self.scrypt_identity(passphrase);
        let payload = Zeroizing::new(self.open(ciphertext, &identity, true)?);
        Ok(frame::decode(&payload, self.config.max_message_size)?.plaintext)
    }

    fn parse_message(&self, candidate: &str) -> Result<()> {
        let armored_reader = age::armor::ArmoredReader::new(candidate.as_bytes());
        age::Decryptor::new(armored_reader)
            .map(|_| ())
            .map_err(|e| KeysealError::DecryptionFailed {
                reason: format!("Invalid envelope: {e}"),
            })
    }

    fn name(&self) -> &str {
        "age"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_engine() -> AgeEngine {
        AgeEngine::new(EngineConfig {
            scrypt_work_factor: 10,
            max_work_factor: 12,
            ..EngineConfig::default()
        })
        .unwrap()
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    fn keypair(engine: &AgeEngine, name: &str, pass: &str) -> (AgePublicKey, AgeUnlockedKey) {
        let pair = engine
            .generate_keypair(&UserId::new(name, format!("{name}@example.com")), &secret(pass))
            .unwrap();
        let public = engine.parse_public_key(pair.public_key()).unwrap();
        let private = engine.parse_private_key(pair.private_key()).unwrap();
        let unlocked = engine.unlock_private_key(&private, &secret(pass)).unwrap();
        (public, unlocked)
    }

    #[test]
    fn generated_keypair_unlocks_and_matches() {
        let engine = fast_engine();
        let (public, unlocked) = keypair(&engine, "alice", "pw");

        assert!(engine.key_matches(&public, &unlocked));
        assert_eq!(
            engine.primary_user_id(&public).unwrap(),
            UserId::new("alice", "alice@example.com")
        );
        assert_eq!(engine.fingerprint(&public).len(), 40);
    }

    #[test]
    fn unlock_with_wrong_passphrase_fails() {
        let engine = fast_engine();
        let pair = engine
            .generate_keypair(&UserId::new("a", "a@b.c"), &secret("right"))
            .unwrap();
        let private = engine.parse_private_key(pair.private_key()).unwrap();

        let err = engine
            .unlock_private_key(&private, &secret("wrong"))
            .err()
            .unwrap();
        assert!(matches!(err, KeysealError::DecryptionFailed { .. }));
    }

    #[test]
    fn armored_output_is_age_format() {
        let engine = fast_engine();
        let envelope = engine
            .encrypt_symmetric(b"hello", &secret("pw"), Compression::Zlib)
            .unwrap();
        assert!(envelope.as_str().contains("BEGIN AGE ENCRYPTED FILE"));
        assert!(engine.parse_message(envelope.as_str()).is_ok());
    }

    #[test]
    fn signed_message_verifies_against_sender() {
        let engine = fast_engine();
        let (alice_pub, alice_key) = keypair(&engine, "alice", "a");
        let (bob_pub, bob_key) = keypair(&engine, "bob", "b");

        let envelope = engine
            .encrypt_asymmetric(b"Hello world!", &bob_pub, Some(&alice_key))
            .unwrap();
        let message = engine
            .decrypt_asymmetric(envelope.as_str(), &bob_key, Some(&alice_pub))
            .unwrap();

        assert_eq!(message.plaintext, b"Hello world!");
        assert_eq!(
            message.verification,
            Verification::Verified {
                signer_fingerprint: alice_pub.fingerprint().to_hex()
            }
        );
    }

    #[test]
    fn verification_against_other_key_fails() {
        let engine = fast_engine();
        let (_, alice_key) = keypair(&engine, "alice", "a");
        let (bob_pub, bob_key) = keypair(&engine, "bob", "b");
        let (carol_pub, _) = keypair(&engine, "carol", "c");

        let envelope = engine
            .encrypt_asymmetric(b"hi", &bob_pub, Some(&alice_key))
            .unwrap();
        let err = engine
            .decrypt_asymmetric(envelope.as_str(), &bob_key, Some(&carol_pub))
            .unwrap_err();
        assert!(matches!(err, KeysealError::SignatureVerificationFailed { .. }));
    }

    #[test]
    fn unsigned_message_reports_not_signed() {
        let engine = fast_engine();
        let (bob_pub, bob_key) = keypair(&engine, "bob", "b");

        let envelope = engine.encrypt_asymmetric(b"hi", &bob_pub, None).unwrap();
        let message = engine
            .decrypt_asymmetric(envelope.as_str(), &bob_key, None)
            .unwrap();
        assert_eq!(message.verification, Verification::NotRequested { signed: false });

        let err = engine
            .decrypt_asymmetric(envelope.as_str(), &bob_key, Some(&bob_pub))
            .unwrap_err();
        assert!(err.to_string().contains("not signed"));
    }

    #[test]
    fn passphrase_envelope_is_not_accepted_by_key_path() {
        let engine = fast_engine();
        let (_, bob_key) = keypair(&engine, "bob", "b");
        let envelope = engine
            .encrypt_symmetric(b"hi", &secret("pw"), Compression::None)
            .unwrap();

        let err = engine
            .decrypt_asymmetric(envelope.as_str(), &bob_key, None)
            .unwrap_err();
        assert!(matches!(err, KeysealError::DecryptionFailed { .. }));
    }

    #[test]
    fn excessive_work_factor_is_refused() {
        let strong = AgeEngine::new(EngineConfig {
            scrypt_work_factor: 14,
            max_work_factor: 14,
            ..EngineConfig::default()
        })
        .unwrap();
        let envelope = strong
            .encrypt_symmetric(b"hi", &secret("pw"), Compression::None)
            .unwrap();

        let err = fast_engine()
            .decrypt_symmetric(envelope.as_str(), &secret("pw"))
            .unwrap_err();
        assert!(matches!(err, KeysealError::DecryptionFailed { .. }));
    }

    #[test]
    fn empty_passphrase_is_rejected() {
        let err = fast_engine()
            .encrypt_symmetric(b"hi", &secret(""), Compression::Zlib)
            .unwrap_err();
        assert!(matches!(err, KeysealError::EmptyPassphrase));
    }

    #[test]
    fn new_rejects_inconsistent_limits() {
        let err = AgeEngine::new(EngineConfig {
            scrypt_work_factor: 16,
            max_work_factor: 12,
            ..EngineConfig::default()
        })
        .err()
        .unwrap();
        assert!(err.to_string().contains("max_work_factor"));

        let err = AgeEngine::new(EngineConfig {
            compression_level: 12,
            ..EngineConfig::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, KeysealError::InvalidConfig { .. }));
    }

    #[test]
    fn from_config_uses_engine_section() {
        let config = AppConfig::from_toml_str(
            "[engine]\nscrypt_work_factor = 11\nmax_work_factor = 13\n",
        )
        .unwrap();
        let engine = AgeEngine::from_config(&config).unwrap();
        assert_eq!(engine.config().scrypt_work_factor, 11);
        assert_eq!(engine.config().max_work_factor, 13);
    }
}
