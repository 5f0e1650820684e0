//! Logging in

use crate::manager::{LoginError, LoginErrorKind, Readiness};
use crate::model::claims::UserId;
use crate::model::session::Session;
use crate::testing::user_token;

use super::*;

#[tokio::test]
async fn login_authenticates_and_persists() {
    let token = user_token(1, &["ROLE_UTENTE"], NOW + 3600);
    let (manager, _) = manager(
        MemoryStore::new(),
        StubExchange::replying([Reply::Token(token.clone())]),
    );
    manager.initialize().await;

    let session = manager.login(&credentials()).await.unwrap();
    assert!(session.is_authenticated());
    assert_eq!(session.role(), Some("UTENTE"));
    assert_eq!(session.user_id(), Some(&UserId::Numeric(1)));

    assert_eq!(manager.session(), session);
    assert_eq!(manager.store().load(KEY).await.unwrap(), Some(token));
}

#[tokio::test]
async fn login_replaces_previous_session() {
    let (manager, _) = manager(
        MemoryStore::new(),
        StubExchange::replying([
            Reply::Token(user_token(1, &["ROLE_UTENTE"], NOW + 3600)),
            Reply::Token(user_token(2, &["ROLE_AMMINISTRATORE"], NOW + 3600)),
        ]),
    );

    manager.login(&credentials()).await.unwrap();
    let session = manager.login(&credentials()).await.unwrap();

    assert_eq!(session.user_id(), Some(&UserId::Numeric(2)));
    assert_eq!(manager.session().role(), Some("AMMINISTRATORE"));
}

#[tokio::test]
async fn rejected_login_keeps_state() {
    let token = user_token(1, &["ROLE_UTENTE"], NOW + 3600);
    let (manager, _) = manager(
        MemoryStore::new(),
        StubExchange::replying([
            Reply::Token(token.clone()),
            Reply::Reject {
                status: 401,
                message: Some("Credenziali non valide"),
            },
        ]),
    );

    let before = manager.login(&credentials()).await.unwrap();
    let err = manager.login(&credentials()).await.unwrap_err();

    assert_eq!(err.kind(), LoginErrorKind::Rejected);
    assert_eq!(err.message("fallback"), "Credenziali non valide");
    assert_eq!(manager.session(), before);
    assert_eq!(manager.store().load(KEY).await.unwrap(), Some(token));
}

#[tokio::test]
async fn rejected_login_while_logged_out() {
    let (manager, _) = manager(
        MemoryStore::new(),
        StubExchange::replying([Reply::Reject {
            status: 500,
            message: None,
        }]),
    );
    manager.initialize().await;

    let err = manager.login(&credentials()).await.unwrap_err();
    let fallback = &manager.settings().fallback_message;

    assert!(matches!(
        err,
        LoginError::Exchange(ExchangeError::Rejected { status: 500, .. })
    ));
    assert_eq!(&err.message(fallback), fallback);
    assert_eq!(manager.session(), Session::unauthenticated());
    assert_eq!(manager.store().load(KEY).await.unwrap(), None);
}

#[tokio::test]
async fn unusable_token_rejected() {
    let (manager, _) = manager(
        MemoryStore::new(),
        StubExchange::replying([
            Reply::Token("fake_token".into()),
            Reply::Token(user_token(1, &["ROLE_UTENTE"], NOW - 1)),
        ]),
    );

    let err = manager.login(&credentials()).await.unwrap_err();
    assert!(matches!(err, LoginError::InvalidToken(_)));
    assert_eq!(err.kind(), LoginErrorKind::InvalidToken);

    let err = manager.login(&credentials()).await.unwrap_err();
    assert!(matches!(err, LoginError::Expired));
    assert_eq!(err.message("fallback"), "fallback");

    assert!(!manager.session().is_authenticated());
    assert_eq!(manager.store().load(KEY).await.unwrap(), None);
}

#[tokio::test]
async fn storage_failure_fails_login() {
    let (manager, _) = manager(
        BrokenStore,
        StubExchange::replying([Reply::Token(user_token(1, &["ROLE_UTENTE"], NOW + 60))]),
    );

    let err = manager.login(&credentials()).await.unwrap_err();
    assert_eq!(err.kind(), LoginErrorKind::Storage);
    assert!(!manager.session().is_authenticated());
}

#[tokio::test]
async fn login_does_not_change_readiness() {
    let (manager, _) = manager(
        MemoryStore::new(),
        StubExchange::replying([Reply::Token(user_token(1, &["ROLE_UTENTE"], NOW + 60))]),
    );

    manager.login(&credentials()).await.unwrap();
    assert_eq!(manager.readiness(), Readiness::Pending);
}

#[tokio::test]
async fn login_survives_restart() {
    let store = MemoryStore::new();
    let (manager, _) = manager(
        store.clone(),
        StubExchange::replying([Reply::Token(user_token(4, &["ROLE_AMMINISTRATORE"], NOW + 3600))]),
    );
    let logged_in = manager.login(&credentials()).await.unwrap();
    drop(manager);

    let (restarted, clock) = super::manager(store, StubExchange::default());
    clock.advance(1800);
    let restored = restarted.initialize().await;

    assert_eq!(restored, logged_in);
    assert!(restored.has_role("AMMINISTRATORE"));
}

#[tokio::test]
async fn racing_logins_agree_on_last_commit() {
    let first = user_token(1, &["ROLE_UTENTE"], NOW + 3600);
    let second = user_token(2, &["ROLE_AMMINISTRATORE"], NOW + 3600);

    // First login is slower, so its commit lands last
    let (manager, _) = manager(
        MemoryStore::new(),
        StubExchange::delayed([
            (Duration::from_millis(50), Reply::Token(first.clone())),
            (Duration::ZERO, Reply::Token(second)),
        ]),
    );

    let credentials = credentials();
    let (slow, fast) = tokio::join!(manager.login(&credentials), manager.login(&credentials));
    slow.unwrap();
    fast.unwrap();

    let session = manager.session();
    assert_eq!(session.user_id(), Some(&UserId::Numeric(1)));
    assert_eq!(manager.store().load(KEY).await.unwrap(), Some(first));
}
