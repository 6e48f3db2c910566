mod common;

use common::{HookedEngine, active_container, empty_container, secret};
use keyseal::{IdentityContainer, KeysealError};

#[test]
fn new_container_is_empty() {
    let container = empty_container();

    assert!(!container.is_active());
    assert!(!container.check_integrity());
    assert_eq!(container.nickname(), None);
    assert_eq!(container.email(), None);
    assert_eq!(container.fingerprint(), None);
    assert_eq!(container.public_key_armored(), None);
    assert!(container.summary().is_none());
}

#[test]
fn originate_populates_every_field() {
    let container = active_container("John Smith", "john.smith@gmail.com", "1q2w3e4r5t6y7u8i9o0p");

    assert!(container.check_integrity());
    assert_eq!(container.nickname(), Some("John Smith"));
    assert_eq!(container.email(), Some("john.smith@gmail.com"));

    let fingerprint = container.fingerprint().unwrap();
    assert_eq!(fingerprint.len(), 40);
    assert_eq!(fingerprint, fingerprint.to_uppercase());

    let public_key = container.public_key_armored().unwrap();
    assert!(public_key.starts_with("-----BEGIN KEYSEAL PUBLIC KEY-----"));
}

#[test]
fn two_originations_produce_distinct_fingerprints() {
    let a = active_container("Alice", "alice@example.com", "pw");
    let b = active_container("Alice", "alice@example.com", "pw");
    assert_ne!(a.fingerprint(), b.fingerprint());
}

#[test]
fn erase_clears_everything_and_is_idempotent() {
    let mut container = active_container("Alice", "alice@example.com", "pw");

    container.erase();
    assert!(!container.check_integrity());
    assert!(!container.is_active());
    assert_eq!(container.nickname(), None);
    assert_eq!(container.public_key_armored(), None);

    container.erase();
    assert!(!container.check_integrity());
}

#[test]
fn originate_with_empty_passphrase_keeps_empty_state() {
    let mut container = empty_container();

    let err = container
        .originate("Alice", "alice@example.com", &secret(""))
        .unwrap_err();
    assert!(matches!(err, KeysealError::EmptyPassphrase));
    assert!(!container.is_active());
}

#[test]
fn failed_originate_keeps_previous_identity() {
    let mut container = active_container("Alice", "alice@example.com", "pw");
    let before = container.summary().unwrap();

    let err = container
        .originate("", "bob@example.com", &secret("pw2"))
        .unwrap_err();
    assert!(matches!(err, KeysealError::KeyGenerationFailed { .. }));

    let err = container.originate("Bob", "bob@example.com", &secret("")).unwrap_err();
    assert!(matches!(err, KeysealError::EmptyPassphrase));

    assert!(container.check_integrity());
    assert_eq!(container.summary().unwrap(), before);
}

#[test]
fn originate_again_replaces_identity() {
    let mut container = active_container("Alice", "alice@example.com", "pw");
    let first = container.fingerprint().unwrap().to_string();

    container
        .originate("Bob", "bob@example.com", &secret("other"))
        .unwrap();

    assert!(container.check_integrity());
    assert_eq!(container.nickname(), Some("Bob"));
    assert_ne!(container.fingerprint(), Some(first.as_str()));
}

#[test]
fn user_id_is_embedded_verbatim() {
    let container = active_container("Zoë O'Brien <ops>", "zoe+keys@example.org", "pw");
    assert_eq!(container.nickname(), Some("Zoë O'Brien <ops>"));
    assert_eq!(container.email(), Some("zoe+keys@example.org"));
}

#[test]
fn summary_matches_queries() {
    let container = active_container("Alice", "alice@example.com", "pw");
    let summary = container.summary().unwrap();

    assert_eq!(summary.nickname, "Alice");
    assert_eq!(summary.email, "alice@example.com");
    assert_eq!(Some(summary.fingerprint.as_str()), container.fingerprint());
    assert_eq!(Some(summary.public_key.as_str()), container.public_key_armored());
    assert!(summary.to_string().starts_with("Alice <alice@example.com> ["));
}

#[test]
fn debug_output_never_contains_secrets() {
    let container = active_container("Alice", "alice@example.com", "hunter2-very-secret");
    let debug = format!("{container:?}");

    assert!(debug.contains("IdentityContainer"));
    assert!(!debug.contains("hunter2-very-secret"));
    assert!(!debug.contains("PRIVATE KEY"));
}

#[test]
fn unusable_generated_pair_is_a_key_generation_failure() {
    let mut container = IdentityContainer::new(HookedEngine::mismatched());

    let err = container
        .originate("Alice", "alice@example.com", &secret("pw"))
        .unwrap_err();
    assert!(matches!(
        err,
        KeysealError::KeyGenerationFailed { ref reason } if reason.contains("does not belong")
    ));
    assert!(!container.is_active());
}
