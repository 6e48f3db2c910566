#![allow(dead_code)]

use std::time::Duration;

use keyseal::adapters::engine::key_material::{AgePrivateKey, AgePublicKey, AgeUnlockedKey};
use keyseal::core::models::envelope::Envelope;
use keyseal::core::models::keypair::ArmoredKeypair;
use keyseal::{
    AgeEngine, Compression, CryptoEngine, DecryptedMessage, EngineConfig, IdentityContainer,
    Result, SecretString, UserId,
};

/// Engine with a low scrypt cost so tests stay fast.
pub fn fast_engine() -> AgeEngine {
    AgeEngine::new(EngineConfig {
        scrypt_work_factor: 10,
        max_work_factor: 12,
        ..EngineConfig::default()
    })
    .unwrap()
}

pub fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

pub fn empty_container() -> IdentityContainer<AgeEngine> {
    IdentityContainer::new(fast_engine())
}

/// Container with a freshly originated identity.
pub fn active_container(name: &str, email: &str, passphrase: &str) -> IdentityContainer<AgeEngine> {
    let mut container = empty_container();
    container
        .originate(name, email, &secret(passphrase))
        .unwrap();
    container
}

/// `AgeEngine` with hooks into key generation: an optional delay, and
/// optionally a public key paired with someone else's private key.
pub struct HookedEngine {
    inner: AgeEngine,
    keygen_delay: Duration,
    mismatched_keys: bool,
}

impl HookedEngine {
    pub fn slow(keygen_delay: Duration) -> Self {
        Self {
            inner: fast_engine(),
            keygen_delay,
            mismatched_keys: false,
        }
    }

    pub fn mismatched() -> Self {
        Self {
            inner: fast_engine(),
            keygen_delay: Duration::ZERO,
            mismatched_keys: true,
        }
    }
}

impl CryptoEngine for HookedEngine {
    type PublicKey = AgePublicKey;
    type PrivateKey = AgePrivateKey;
    type UnlockedKey = AgeUnlockedKey;

    fn generate_keypair(
        &self,
        user_id: &UserId,
        passphrase: &SecretString,
    ) -> Result<ArmoredKeypair> {
        std::thread::sleep(self.keygen_delay);
        let pair = self.inner.generate_keypair(user_id, passphrase)?;
        if !self.mismatched_keys {
            return Ok(pair);
        }
        let other = self.inner.generate_keypair(user_id, passphrase)?;
        Ok(ArmoredKeypair::new(
            pair.public_key().to_owned(),
            other.private_key().to_owned(),
        ))
    }

    fn parse_public_key(&self, armored: &str) -> Result<AgePublicKey> {
        self.inner.parse_public_key(armored)
    }

    fn parse_private_key(&self, armored: &str) -> Result<AgePrivateKey> {
        self.inner.parse_private_key(armored)
    }

    fn unlock_private_key(
        &self,
        key: &AgePrivateKey,
        passphrase: &SecretString,
    ) -> Result<AgeUnlockedKey> {
        self.inner.unlock_private_key(key, passphrase)
    }

    fn key_matches(&self, public: &AgePublicKey, unlocked: &AgeUnlockedKey) -> bool {
        self.inner.key_matches(public, unlocked)
    }

    fn fingerprint(&self, key: &AgePublicKey) -> String {
        self.inner.fingerprint(key)
    }

    fn primary_user_id(&self, key: &AgePublicKey) -> Result<UserId> {
        self.inner.primary_user_id(key)
    }

    fn encrypt_asymmetric(
        &self,
        plaintext: &[u8],
        recipient: &AgePublicKey,
        signer: Option<&AgeUnlockedKey>,
    ) -> Result<Envelope> {
        self.inner.encrypt_asymmetric(plaintext, recipient, signer)
    }

    fn decrypt_asymmetric(
        &self,
        ciphertext: &str,
        key: &AgeUnlockedKey,
        verifier: Option<&AgePublicKey>,
    ) -> Result<DecryptedMessage> {
        self.inner.decrypt_asymmetric(ciphertext, key, verifier)
    }

    fn encrypt_symmetric(
        &self,
        plaintext: &[u8],
        passphrase: &SecretString,
        compression: Compression,
    ) -> Result<Envelope> {
        self.inner.encrypt_symmetric(plaintext, passphrase, compression)
    }

    fn decrypt_symmetric(&self, ciphertext: &str, passphrase: &SecretString) -> Result<Vec<u8>> {
        self.inner.decrypt_symmetric(ciphertext, passphrase)
    }

    fn parse_message(&self, candidate: &str) -> Result<()> {
        self.inner.parse_message(candidate)
    }

    fn name(&self) -> &str {
        "hooked-age"
    }
}
