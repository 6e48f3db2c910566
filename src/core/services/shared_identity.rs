use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::RwLock;

use crate::core::errors::{KeysealError, Result};
use crate::core::models::envelope::{Envelope, SealedStorage};
use crate::core::models::identity_summary::IdentitySummary;
use crate::core::models::message::{DecryptedMessage, Signing};
use crate::core::services::identity_container::IdentityContainer;
use crate::core::traits::engine::CryptoEngine;

/// Async handle to one `IdentityContainer`, shareable across tasks.
///
/// Lifecycle operations (`originate`, `unseal`, `erase`) hold the write
/// lock, so at most one runs at a time. Everything else holds the read
/// lock and may run concurrently. Engine work runs on the blocking pool
/// and every call is bounded by `timeout`.
///
/// The lock guard moves into the blocking task. A mutation that times out
/// may keep computing in the background, but it must win a `CommitGate`
/// before it replaces the identity; once the caller has been told
/// `Timeout`, that gate is closed and the previous identity stays.
pub struct SharedIdentity<E: CryptoEngine + 'static> {
    inner: Arc<RwLock<IdentityContainer<E>>>,
    timeout: Duration,
}

impl<E: CryptoEngine + 'static> Clone for SharedIdentity<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            timeout: self.timeout,
        }
    }
}

impl<E: CryptoEngine + 'static> SharedIdentity<E> {
    pub fn new(container: IdentityContainer<E>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(container)),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn originate(
        &self,
        display_name: String,
        email: String,
        passphrase: SecretString,
    ) -> Result<()> {
        self.mutate("originate", move |c, gate| {
            let state = c.prepare_originate(&display_name, &email, &passphrase)?;
            gate.commit("originate")?;
            c.bind(state, "identity originated");
            Ok(())
        })
        .await
    }

    pub async fn unseal(&self, envelope: String, passphrase: SecretString) -> Result<()> {
        self.mutate("unseal", move |c, gate| {
            let state = c.prepare_unseal(&envelope, &passphrase)?;
            gate.commit("unseal")?;
            c.bind(state, "identity restored from envelope");
            Ok(())
        })
        .await
    }

    pub async fn erase(&self) -> Result<()> {
        self.mutate("erase", |c, gate| {
            gate.commit("erase")?;
            c.erase();
            Ok(())
        })
        .await
    }

    pub async fn check_integrity(&self) -> bool {
        self.inner.read().await.check_integrity()
    }

    pub async fn summary(&self) -> Option<IdentitySummary> {
        self.inner.read().await.summary()
    }

    pub async fn seal(&self) -> Result<SealedStorage> {
        self.read("seal", |c| c.seal()).await
    }

    pub async fn validate_envelope(&self, candidate: String) -> bool {
        self.read("validate_envelope", move |c| Ok(c.validate_envelope(&candidate)))
            .await
            .unwrap_or(false)
    }

    pub async fn encrypt_to_recipient(
        &self,
        plaintext: Vec<u8>,
        recipient_public_key: String,
        signing: Signing,
    ) -> Result<Envelope> {
        self.read("encrypt_to_recipient", move |c| {
            c.encrypt_to_recipient(&plaintext, &recipient_public_key, signing)
        })
        .await
    }

    pub async fn decrypt_from_sender(
        &self,
        envelope: String,
        sender_public_key: Option<String>,
    ) -> Result<DecryptedMessage> {
        self.read("decrypt_from_sender", move |c| {
            c.decrypt_from_sender(&envelope, sender_public_key.as_deref())
        })
        .await
    }

    pub async fn encrypt_symmetric(
        &self,
        plaintext: Vec<u8>,
        passphrase: SecretString,
    ) -> Result<Envelope> {
        self.read("encrypt_symmetric", move |c| {
            c.encrypt_symmetric(&plaintext, &passphrase)
        })
        .await
    }

    pub async fn decrypt_symmetric(
        &self,
        envelope: String,
        passphrase: SecretString,
    ) -> Result<Vec<u8>> {
        self.read("decrypt_symmetric", move |c| {
            c.decrypt_symmetric(&envelope, &passphrase)
        })
        .await
    }

    /// Run `f` on the blocking pool while holding the write lock. `f` must
    /// call `CommitGate::commit` before it changes the container.
    async fn mutate<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut IdentityContainer<E>, &CommitGate) -> Result<T> + Send + 'static,
    {
        let gate = CommitGate::default();
        let task_gate = gate.clone();
        let inner = Arc::clone(&self.inner);
        let work = async move {
            let mut guard = inner.write_owned().await;
            tokio::task::spawn_blocking(move || f(&mut *guard, &task_gate)).await
        };
        self.bounded(operation, &gate, work).await
    }

    /// Run `f` on the blocking pool while holding a read lock.
    async fn read<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&IdentityContainer<E>) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let work = async move {
            let guard = inner.read_owned().await;
            tokio::task::spawn_blocking(move || f(&*guard)).await
        };
        self.bounded(operation, &CommitGate::default(), work).await
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        gate: &CommitGate,
        work: impl Future<Output = std::result::Result<Result<T>, tokio::task::JoinError>>,
    ) -> Result<T> {
        tokio::pin!(work);
        let joined = match tokio::time::timeout(self.timeout, &mut work).await {
            Ok(joined) => joined,
            Err(_) if gate.abandon() => {
                tracing::warn!(operation, timeout = ?self.timeout, "identity operation timed out");
                return Err(KeysealError::Timeout {
                    operation: operation.into(),
                });
            }
            // Already committed: the task is only swapping the state in.
            Err(_) => work.await,
        };

        match joined {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => {
                std::panic::resume_unwind(join_error.into_panic())
            }
            Err(_) => Err(KeysealError::Cancelled {
                operation: operation.into(),
            }),
        }
    }
}

const PENDING: u8 = 0;
const COMMITTED: u8 = 1;
const ABANDONED: u8 = 2;

/// One-shot race between a mutation committing and its caller giving up.
/// Exactly one side wins.
#[derive(Clone, Default)]
pub(super) struct CommitGate(Arc<AtomicU8>);

impl CommitGate {
    /// Claim the right to change the container. Fails with `Timeout` when
    /// the caller has already given up.
    pub(super) fn commit(&self, operation: &'static str) -> Result<()> {
        self.0
            .compare_exchange(PENDING, COMMITTED, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| KeysealError::Timeout {
                operation: operation.into(),
            })
    }

    /// Give up on the mutation. False if it has already committed.
    fn abandon(&self) -> bool {
        self.0
            .compare_exchange(PENDING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
