use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use super::armor::{armor, dearmor};
use super::frame::SIGNER_LEN;
use crate::core::errors::{KeysealError, Result};
use crate::core::models::user_id::UserId;

pub(super) const KEY_VERSION: u8 = 1;
const PUBLIC_LABEL: &str = "KEYSEAL PUBLIC KEY";
const PRIVATE_LABEL: &str = "KEYSEAL PRIVATE KEY";
const FINGERPRINT_DOMAIN: &[u8] = b"keyseal/fingerprint/v1";
const CERTIFICATION_DOMAIN: &[u8] = b"keyseal/certification/v1";

/// First 20 bytes of the SHA-256 key digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub(super) [u8; SIGNER_LEN]);

impl Fingerprint {
    fn compute(
        created: i64,
        recipient: &age::x25519::Recipient,
        verifying_key: &VerifyingKey,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(FINGERPRINT_DOMAIN);
        hasher.update([KEY_VERSION]);
        hasher.update(created.to_be_bytes());
        hasher.update(recipient.to_string().as_bytes());
        hasher.update(verifying_key.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; SIGNER_LEN];
        bytes.copy_from_slice(&digest[..SIGNER_LEN]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNER_LEN] {
        &self.0
    }

    /// Canonical form: 40 uppercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

/// Public half of an age/Ed25519 identity.
#[derive(Clone)]
pub struct AgePublicKey {
    pub(super) created: i64,
    pub(super) user_id: UserId,
    pub(super) recipient: age::x25519::Recipient,
    pub(super) verifying_key: VerifyingKey,
    pub(super) fingerprint: Fingerprint,
}

impl AgePublicKey {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created, 0)
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// The age recipient string (`age1...`) messages are encrypted to.
    pub fn recipient(&self) -> String {
        self.recipient.to_string()
    }
}

impl std::fmt::Debug for AgePublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgePublicKey")
            .field("user_id", &self.user_id)
            .field("fingerprint", &self.fingerprint.to_hex())
            .finish()
    }
}

/// Private half, still sealed under its passphrase.
pub struct AgePrivateKey {
    pub(super) fingerprint: String,
    pub(super) sealed: String,
}

/// Operation-ready private key material.
pub struct AgeUnlockedKey {
    pub(super) identity: age::x25519::Identity,
    pub(super) signing_key: SigningKey,
    pub(super) fingerprint: Fingerprint,
}

impl AgeUnlockedKey {
    pub(super) fn from_secret(record: &SecretKeyRecord) -> Result<Self> {
        let identity = record
            .identity
            .parse::<age::x25519::Identity>()
            .map_err(|e| KeysealError::InvalidKey {
                detail: format!("invalid age secret key: {e}"),
            })?;

        let mut seed = hex::decode(&record.signing_key).map_err(|e| KeysealError::InvalidKey {
            detail: format!("invalid signing key encoding: {e}"),
        })?;
        let seed_bytes: [u8; 32] = seed
            .as_slice()
            .try_into()
            .map_err(|_| KeysealError::InvalidKey {
                detail: "signing key must be 32 bytes".into(),
            })?;
        seed.zeroize();
        let signing_key = SigningKey::from_bytes(&seed_bytes);

        let fingerprint = Fingerprint::compute(
            record.created,
            &identity.to_public(),
            &signing_key.verifying_key(),
        );

        Ok(Self {
            identity,
            signing_key,
            fingerprint,
        })
    }

    pub(super) fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

/// Serialized body of a public key armor block.
#[derive(Serialize, Deserialize)]
pub(super) struct PublicKeyRecord {
    version: u8,
    created: i64,
    user_id: UserId,
    recipient: String,
    verifying_key: String,
    certification: String,
}

impl PublicKeyRecord {
    /// Build a record whose user id is self-signed by `signing_key`.
    pub(super) fn certify(
        created: i64,
        user_id: &UserId,
        recipient: &age::x25519::Recipient,
        signing_key: &SigningKey,
    ) -> Result<Self> {
        let verifying_key = signing_key.verifying_key();
        let fingerprint = Fingerprint::compute(created, recipient, &verifying_key);
        let payload = certification_payload(&fingerprint, user_id)?;
        let certification = signing_key.sign(&payload);

        Ok(Self {
            version: KEY_VERSION,
            created,
            user_id: user_id.clone(),
            recipient: recipient.to_string(),
            verifying_key: hex::encode(verifying_key.as_bytes()),
            certification: hex::encode(certification.to_bytes()),
        })
    }

    pub(super) fn to_armored(&self) -> Result<String> {
        let json = serde_json::to_vec(self).map_err(|e| KeysealError::KeyGenerationFailed {
            reason: format!("could not encode public key: {e}"),
        })?;
        Ok(armor(PUBLIC_LABEL, &json))
    }

    pub(super) fn from_armored(armored: &str) -> Result<Self> {
        let bytes = dearmor(PUBLIC_LABEL, armored).map_err(|detail| KeysealError::InvalidKey {
            detail,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| KeysealError::InvalidKey {
            detail: format!("invalid public key record: {e}"),
        })
    }

    /// Decode the key material and check the self-certification.
    pub(super) fn into_key(self) -> Result<AgePublicKey> {
        if self.version != KEY_VERSION {
            return Err(KeysealError::InvalidKey {
                detail: format!("unsupported public key version {}", self.version),
            });
        }

        let recipient = self
            .recipient
            .parse::<age::x25519::Recipient>()
            .map_err(|e| KeysealError::InvalidKey {
                detail: format!("invalid recipient '{}': {e}", self.recipient),
            })?;

        let vk_bytes: [u8; 32] = hex::decode(&self.verifying_key)
            .ok()
            .and_then(|v| v.try_into().ok())
            .ok_or_else(|| KeysealError::InvalidKey {
                detail: "verifying key must be 32 hex-encoded bytes".into(),
            })?;
        let verifying_key =
            VerifyingKey::from_bytes(&vk_bytes).map_err(|e| KeysealError::InvalidKey {
                detail: format!("invalid verifying key: {e}"),
            })?;

        let sig_bytes: [u8; 64] = hex::decode(&self.certification)
            .ok()
            .and_then(|v| v.try_into().ok())
            .ok_or_else(|| KeysealError::InvalidKey {
                detail: "certification must be 64 hex-encoded bytes".into(),
            })?;

        let fingerprint = Fingerprint::compute(self.created, &recipient, &verifying_key);
        let payload = certification_payload(&fingerprint, &self.user_id)?;
        verifying_key
            .verify_strict(&payload, &Signature::from_bytes(&sig_bytes))
            .map_err(|_| KeysealError::InvalidKey {
                detail: "user id certification does not verify".into(),
            })?;

        Ok(AgePublicKey {
            created: self.created,
            user_id: self.user_id,
            recipient,
            verifying_key,
            fingerprint,
        })
    }
}

/// Serialized body of a private key armor block. `sealed` is an age
/// passphrase envelope of a `SecretKeyRecord`.
#[derive(Serialize, Deserialize)]
pub(super) struct PrivateKeyRecord {
    pub(super) version: u8,
    pub(super) fingerprint: String,
    pub(super) sealed: String,
}

impl PrivateKeyRecord {
    pub(super) fn to_armored(&self) -> Result<String> {
        let json = serde_json::to_vec(self).map_err(|e| KeysealError::KeyGenerationFailed {
            reason: format!("could not encode private key: {e}"),
        })?;
        Ok(armor(PRIVATE_LABEL, &json))
    }

    pub(super) fn from_armored(armored: &str) -> Result<AgePrivateKey> {
        let bytes = dearmor(PRIVATE_LABEL, armored).map_err(|detail| KeysealError::InvalidKey {
            detail,
        })?;
        let record: Self = serde_json::from_slice(&bytes).map_err(|e| KeysealError::InvalidKey {
            detail: format!("invalid private key record: {e}"),
        })?;
        if record.version != KEY_VERSION {
            return Err(KeysealError::InvalidKey {
                detail: format!("unsupported private key version {}", record.version),
            });
        }
        Ok(AgePrivateKey {
            fingerprint: record.fingerprint,
            sealed: record.sealed,
        })
    }
}

/// Secret key material as it exists inside the sealed private key.
#[derive(Serialize, Deserialize)]
pub(super) struct SecretKeyRecord {
    pub(super) created: i64,
    pub(super) identity: String,
    pub(super) signing_key: String,
}

impl SecretKeyRecord {
    pub(super) fn new(
        created: i64,
        identity: &age::x25519::Identity,
        signing_key: &SigningKey,
    ) -> Self {
        Self {
            created,
            identity: identity.to_string().expose_secret().to_owned(),
            signing_key: hex::encode(signing_key.to_bytes()),
        }
    }
}

impl Drop for SecretKeyRecord {
    fn drop(&mut self) {
        self.identity.zeroize();
        self.signing_key.zeroize();
    }
}

fn certification_payload(fingerprint: &Fingerprint, user_id: &UserId) -> Result<Vec<u8>> {
    let mut payload = CERTIFICATION_DOMAIN.to_vec();
    let encoded = serde_json::to_vec(&(fingerprint.to_hex(), user_id)).map_err(|e| {
        KeysealError::InvalidKey {
            detail: format!("could not encode user id: {e}"),
        }
    })?;
    payload.extend_from_slice(&encoded);
    Ok(payload)
}
