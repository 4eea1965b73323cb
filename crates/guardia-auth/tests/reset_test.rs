//! Integration tests for the password reset workflow.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{CapturingNotifier, FailingNotifier, InMemoryAccounts};
use guardia_auth::config::AuthConfig;
use guardia_auth::password;
use guardia_auth::reset::PasswordResetService;
use guardia_auth::token;
use guardia_core::clock::{Clock, ManualClock};
use guardia_core::error::GuardiaError;

const STRONG: &str = "Tr0ubadour&Horse";

struct Harness {
    accounts: InMemoryAccounts,
    notifier: CapturingNotifier,
    clock: Arc<ManualClock>,
    svc: PasswordResetService<InMemoryAccounts, CapturingNotifier>,
}

fn harness() -> Harness {
    let accounts = InMemoryAccounts::default();
    let notifier = CapturingNotifier::default();
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let svc = PasswordResetService::new(
        accounts.clone(),
        notifier.clone(),
        AuthConfig::default(),
        clock.clone(),
    );
    Harness {
        accounts,
        notifier,
        clock,
        svc,
    }
}

#[tokio::test]
async fn round_trip_succeeds_exactly_once() {
    let h = harness();
    let acct = h
        .accounts
        .with_account("alice", "alice@example.com", "old-Passw0rd!", &["user"]);

    h.svc.initiate("alice@example.com", Some("10.0.0.1")).await.unwrap();
    let raw = h.notifier.last_token().expect("token delivered");

    h.svc.confirm("alice@example.com", &raw, STRONG).await.unwrap();

    let stored = h.accounts.get(acct.id);
    assert!(password::verify_password(STRONG, &stored.password_hash, None).unwrap());
    assert!(stored.reset_token_hash.is_none());
    assert!(stored.reset_token_expires_at.is_none());

    let err = h
        .svc
        .confirm("alice@example.com", &raw, "An0ther&Strong1")
        .await
        .unwrap_err();
    assert!(matches!(err, GuardiaError::InvalidToken));
}

#[tokio::test]
async fn only_the_hash_is_stored() {
    let h = harness();
    let acct = h
        .accounts
        .with_account("alice", "alice@example.com", "old-Passw0rd!", &[]);

    h.svc.initiate("Alice@Example.com ", None).await.unwrap();
    let raw = h.notifier.last_token().unwrap();
    let stored = h.accounts.get(acct.id);

    assert_ne!(stored.reset_token_hash.as_deref(), Some(raw.as_str()));
    assert_eq!(stored.reset_token_hash, Some(token::hash_reset_token(&raw)));
    assert_eq!(
        stored.reset_token_expires_at,
        Some(h.clock.now() + Duration::hours(1))
    );
    // 32 bytes of entropy, base64url.
    assert_eq!(raw.len(), 43);
}

#[tokio::test]
async fn unknown_email_looks_like_success() {
    let h = harness();
    h.accounts
        .with_account("alice", "alice@example.com", "old-Passw0rd!", &[]);

    h.svc.initiate("nobody@example.com", None).await.unwrap();
    assert!(h.notifier.sent().is_empty());

    let err = h
        .svc
        .confirm("nobody@example.com", "whatever", STRONG)
        .await
        .unwrap_err();
    assert!(matches!(err, GuardiaError::InvalidToken));
}

#[tokio::test]
async fn no_pending_token_is_invalid() {
    let h = harness();
    h.accounts
        .with_account("alice", "alice@example.com", "old-Passw0rd!", &[]);

    let err = h
        .svc
        .confirm("alice@example.com", "guess", STRONG)
        .await
        .unwrap_err();
    assert!(matches!(err, GuardiaError::InvalidToken));
}

#[tokio::test]
async fn wrong_token_is_invalid() {
    let h = harness();
    h.accounts
        .with_account("alice", "alice@example.com", "old-Passw0rd!", &[]);

    h.svc.initiate("alice@example.com", None).await.unwrap();
    let err = h
        .svc
        .confirm("alice@example.com", "not-the-token", STRONG)
        .await
        .unwrap_err();
    assert!(matches!(err, GuardiaError::InvalidToken));
}

#[tokio::test]
async fn new_request_invalidates_previous_token() {
    let h = harness();
    h.accounts
        .with_account("alice", "alice@example.com", "old-Passw0rd!", &[]);

    h.svc.initiate("alice@example.com", None).await.unwrap();
    h.svc.initiate("alice@example.com", None).await.unwrap();
    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 2);
    let (first, second) = (&sent[0].1, &sent[1].1);

    let err = h
        .svc
        .confirm("alice@example.com", first, STRONG)
        .await
        .unwrap_err();
    assert!(matches!(err, GuardiaError::InvalidToken));
    h.svc.confirm("alice@example.com", second, STRONG).await.unwrap();
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let h = harness();
    let acct = h
        .accounts
        .with_account("alice", "alice@example.com", "old-Passw0rd!", &[]);

    h.svc.initiate("alice@example.com", None).await.unwrap();
    let raw = h.notifier.last_token().unwrap();

    h.clock.advance(Duration::hours(1));
    let err = h
        .svc
        .confirm("alice@example.com", &raw, STRONG)
        .await
        .unwrap_err();
    assert!(matches!(err, GuardiaError::TokenExpired));

    // Password untouched, token discarded.
    let stored = h.accounts.get(acct.id);
    assert!(password::verify_password("old-Passw0rd!", &stored.password_hash, None).unwrap());
    assert!(stored.reset_token_hash.is_none());
}

#[tokio::test]
async fn weak_password_keeps_token_usable() {
    let h = harness();
    h.accounts
        .with_account("alice", "alice@example.com", "old-Passw0rd!", &[]);

    h.svc.initiate("alice@example.com", None).await.unwrap();
    let raw = h.notifier.last_token().unwrap();

    for weak in ["short1!A", "alllowercaseletters", "Password123!"] {
        let err = h
            .svc
            .confirm("alice@example.com", &raw, weak)
            .await
            .unwrap_err();
        assert!(
            matches!(err, GuardiaError::WeakPassword { .. }),
            "{weak}: got {err:?}"
        );
    }

    h.svc.confirm("alice@example.com", &raw, STRONG).await.unwrap();
}

#[tokio::test]
async fn success_clears_failed_attempts() {
    let h = harness();
    let acct = h
        .accounts
        .with_account("alice", "alice@example.com", "old-Passw0rd!", &[]);
    {
        use guardia_core::repository::AccountRepository;
        h.accounts.record_failed_login(acct.id).await.unwrap();
        h.accounts.record_failed_login(acct.id).await.unwrap();
        h.accounts
            .lock_until(acct.id, h.clock.now() + Duration::minutes(5))
            .await
            .unwrap();
    }

    h.svc.initiate("alice@example.com", None).await.unwrap();
    let raw = h.notifier.last_token().unwrap();
    h.svc.confirm("alice@example.com", &raw, STRONG).await.unwrap();

    let stored = h.accounts.get(acct.id);
    assert_eq!(stored.failed_login_attempts, 0);
    assert!(stored.locked_until.is_none());
}

#[tokio::test]
async fn delivery_failure_is_indistinguishable_from_unknown_email() {
    let accounts = InMemoryAccounts::default();
    let acct = accounts.with_account("alice", "alice@example.com", "old-Passw0rd!", &[]);
    let svc = PasswordResetService::new(
        accounts.clone(),
        FailingNotifier,
        AuthConfig::default(),
        Arc::new(ManualClock::new(Utc::now())),
    );

    let known = svc.initiate("alice@example.com", None).await;
    let unknown = svc.initiate("nobody@example.com", None).await;

    assert!(known.is_ok(), "{known:?}");
    assert!(unknown.is_ok(), "{unknown:?}");
    // The token was still stored; only delivery failed.
    assert!(accounts.get(acct.id).has_pending_reset());
}

#[tokio::test]
async fn store_failure_is_indistinguishable_from_unknown_email() {
    let h = harness();
    let acct = h
        .accounts
        .with_account("alice", "alice@example.com", "old-Passw0rd!", &[]);
    h.accounts.fail_writes(true);

    h.svc.initiate("alice@example.com", None).await.unwrap();
    h.svc.initiate("nobody@example.com", None).await.unwrap();

    assert!(h.notifier.sent().is_empty());
    assert!(!h.accounts.get(acct.id).has_pending_reset());
}

#[tokio::test]
async fn out_of_range_token_lifetime_fails_for_every_address() {
    let accounts = InMemoryAccounts::default();
    accounts.with_account("alice", "alice@example.com", "old-Passw0rd!", &[]);
    let svc = PasswordResetService::new(
        accounts,
        CapturingNotifier::default(),
        AuthConfig {
            reset_token_lifetime_secs: u64::MAX,
            ..Default::default()
        },
        Arc::new(ManualClock::new(Utc::now())),
    );

    for email in ["alice@example.com", "nobody@example.com"] {
        let err = svc.initiate(email, None).await.unwrap_err();
        assert!(matches!(err, GuardiaError::Validation { .. }), "{email}: {err:?}");
    }
}
