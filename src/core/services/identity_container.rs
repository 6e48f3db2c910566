use secrecy::{ExposeSecret, SecretString};

use crate::core::errors::{KeysealError, Result};
use crate::core::models::identity_summary::IdentitySummary;
use crate::core::models::user_id::UserId;
use crate::core::traits::engine::CryptoEngine;

/// Holds at most one identity and enforces its lifecycle.
///
/// The container is either empty or active. All identity fields live in
/// a single `ActiveIdentity` value, so a transition replaces the whole
/// state in one assignment and a failed transition leaves the previous
/// state exactly as it was.
///
/// Mutating operations take `&mut self`; callers sharing a container
/// across tasks should go through `SharedIdentity`.
pub struct IdentityContainer<E: CryptoEngine> {
    engine: E,
    active: Option<ActiveIdentity<E>>,
}

/// Every field of an active identity. Secret members have no accessor
/// outside the `services` module.
pub(super) struct ActiveIdentity<E: CryptoEngine> {
    pub(super) nickname: String,
    pub(super) email: String,
    pub(super) fingerprint: String,
    pub(super) public_key_armored: String,
    pub(super) private_key_armored: String,
    pub(super) public_key: E::PublicKey,
    pub(super) unlocked: E::UnlockedKey,
    pub(super) passphrase: SecretString,
}

impl<E: CryptoEngine> IdentityContainer<E> {
    /// Create an empty container backed by `engine`.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            active: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Generate a fresh keypair and make it the active identity.
    ///
    /// On any failure the container keeps whatever state it had before.
    pub fn originate(
        &mut self,
        display_name: &str,
        email: &str,
        passphrase: &SecretString,
    ) -> Result<()> {
        let state = self.prepare_originate(display_name, email, passphrase)?;
        self.bind(state, "identity originated");
        Ok(())
    }

    /// Everything `originate` does short of replacing the current state.
    pub(super) fn prepare_originate(
        &self,
        display_name: &str,
        email: &str,
        passphrase: &SecretString,
    ) -> Result<ActiveIdentity<E>> {
        if passphrase.expose_secret().is_empty() {
            return Err(KeysealError::EmptyPassphrase);
        }

        let user_id = UserId::new(display_name, email);
        if user_id.is_incomplete() {
            return Err(KeysealError::KeyGenerationFailed {
                reason: "display name and email must not be empty".into(),
            });
        }

        let keypair = self.engine.generate_keypair(&user_id, passphrase)?;
        let (public_key, private_key) = keypair.into_parts();
        self.derive_active(public_key, private_key, copy_secret(passphrase))
            .map_err(|e| KeysealError::KeyGenerationFailed {
                reason: format!("generated key pair does not load: {e}"),
            })
    }

    /// True iff the container is active and every field is non-empty.
    pub fn check_integrity(&self) -> bool {
        self.active.as_ref().is_some_and(|a| {
            !a.nickname.is_empty()
                && !a.email.is_empty()
                && !a.fingerprint.is_empty()
                && !a.public_key_armored.is_empty()
                && !a.private_key_armored.is_empty()
                && !a.passphrase.expose_secret().is_empty()
        })
    }

    /// Drop the active identity, if any. Secret strings are zeroized on drop.
    pub fn erase(&mut self) {
        if let Some(previous) = self.active.take() {
            tracing::debug!(fingerprint = %previous.fingerprint, "identity erased");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn nickname(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.nickname.as_str())
    }

    pub fn email(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.email.as_str())
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.fingerprint.as_str())
    }

    pub fn public_key_armored(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.public_key_armored.as_str())
    }

    /// Owned snapshot of the public fields.
    pub fn summary(&self) -> Option<IdentitySummary> {
        self.active.as_ref().map(|a| IdentitySummary {
            nickname: a.nickname.clone(),
            email: a.email.clone(),
            fingerprint: a.fingerprint.clone(),
            public_key: a.public_key_armored.clone(),
        })
    }

    pub(super) fn require_active(&self) -> Result<&ActiveIdentity<E>> {
        self.active.as_ref().ok_or(KeysealError::IdentityNotActive)
    }

    pub(super) fn bind(&mut self, state: ActiveIdentity<E>, event: &'static str) {
        tracing::info!(
            fingerprint = %state.fingerprint,
            engine = self.engine.name(),
            "{event}"
        );
        self.active = Some(state);
    }

    /// Parse and unlock a key pair into a complete identity without touching
    /// the container. Display metadata is always re-derived from the public key.
    pub(super) fn derive_active(
        &self,
        public_key_armored: String,
        private_key_armored: String,
        passphrase: SecretString,
    ) -> Result<ActiveIdentity<E>> {
        let public_key = self.engine.parse_public_key(&public_key_armored)?;
        let private_key = self.engine.parse_private_key(&private_key_armored)?;
        let unlocked = self.engine.unlock_private_key(&private_key, &passphrase)?;

        if !self.engine.key_matches(&public_key, &unlocked) {
            return Err(KeysealError::InvalidKey {
                detail: "private key does not belong to the public key".into(),
            });
        }

        let user_id = self.engine.primary_user_id(&public_key)?;
        if user_id.is_incomplete() {
            return Err(KeysealError::MalformedContainer {
                detail: format!("key user id '{user_id}' has an empty name or email"),
            });
        }
        let fingerprint = self.engine.fingerprint(&public_key);

        Ok(ActiveIdentity {
            nickname: user_id.name,
            email: user_id.email,
            fingerprint,
            public_key_armored,
            private_key_armored,
            public_key,
            unlocked,
            passphrase,
        })
    }
}

impl<E: CryptoEngine> std::fmt::Debug for IdentityContainer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityContainer")
            .field("engine", &self.engine.name())
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

/// Copy a passphrase into a new secret box.
pub(super) fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_owned())
}
