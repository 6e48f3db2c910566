//! Single-identity key container with sealed storage envelopes.
//!
//! An [`IdentityContainer`] holds at most one identity: a curve25519
//! keypair, the passphrase protecting it, and the name, email and
//! fingerprint derived from the public key. The container can
//!
//! - originate a fresh identity or restore one from a storage envelope,
//! - seal its secrets into a passphrase-encrypted envelope,
//! - exchange messages with other identities, optionally signed,
//! - encrypt and decrypt with a passphrase alone.
//!
//! Cryptography sits behind the [`CryptoEngine`] port. [`AgeEngine`] is the
//! bundled implementation.
//!
//! ```no_run
//! use keyseal::{AgeEngine, IdentityContainer, SecretString};
//!
//! # fn main() -> keyseal::Result<()> {
//! let passphrase = SecretString::from("correct horse battery staple".to_owned());
//! let mut alice = IdentityContainer::new(AgeEngine::default());
//! alice.originate("Alice", "alice@example.com", &passphrase)?;
//!
//! let sealed = alice.seal()?;
//!
//! let mut restored = IdentityContainer::new(AgeEngine::default());
//! restored.unseal(sealed.envelope.as_str(), &passphrase)?;
//! assert_eq!(restored.fingerprint(), alice.fingerprint());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod core;

pub use secrecy::SecretString;

pub use crate::adapters::engine::age_engine::AgeEngine;
pub use crate::config::app_config::{AppConfig, EngineConfig, OperationsConfig};
pub use crate::core::errors::{KeysealError, Result};
pub use crate::core::models::envelope::{Envelope, SealedStorage};
pub use crate::core::models::identity_summary::IdentitySummary;
pub use crate::core::models::message::{Compression, DecryptedMessage, Signing, Verification};
pub use crate::core::models::user_id::UserId;
pub use crate::core::services::identity_container::IdentityContainer;
pub use crate::core::services::shared_identity::SharedIdentity;
pub use crate::core::traits::engine::CryptoEngine;
