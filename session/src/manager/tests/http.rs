//! Sessions against a real HTTP backend

use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use serde_json::{Value, json};
use warp::Filter;
use warp::http::StatusCode;
use warp::reply::Reply as _;

use crate::config::Api;
use crate::exchange::HttpExchange;
use crate::manager::LoginErrorKind;
use crate::model::claims::UserId;
use crate::store::FileStore;
use crate::testing::user_token;

use super::*;

/// Spawns a backend accepting `user1@example.com` with password `hunter2`
fn backend(token: String) -> HttpExchange {
    let login = warp::post()
        .and(warp::path!("auth" / "login"))
        .and(warp::body::json())
        .map(move |credentials: Value| {
            if credentials == json!({ "email": "user1@example.com", "password": "hunter2" }) {
                warp::reply::json(&json!({ "token": token })).into_response()
            } else {
                warp::reply::with_status(
                    warp::reply::json(&json!({ "message": "Credenziali non valide" })),
                    StatusCode::UNAUTHORIZED,
                )
                .into_response()
            }
        });

    let (addr, server) = warp::serve(login).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    HttpExchange::new(Api::new(format!("http://{addr}"))).unwrap()
}

#[tokio::test]
async fn login_then_restart() {
    let dir = tempfile::tempdir().unwrap();
    let token = user_token(1, &["ROLE_UTENTE"], NOW + 3600);

    let (manager, _) = manager(FileStore::new(dir.path()), backend(token.clone()));
    manager.initialize().await;
    let logged_in = manager.login(&credentials()).await.unwrap();

    assert_eq!(logged_in.role(), Some("UTENTE"));
    assert_eq!(logged_in.user_id(), Some(&UserId::Numeric(1)));

    let (restarted, _) = super::manager(FileStore::new(dir.path()), backend(token));
    assert_eq!(restarted.initialize().await, logged_in);
}

#[tokio::test]
async fn wrong_password_reports_backend_message() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, _) = manager(
        FileStore::new(dir.path()),
        backend(user_token(1, &["ROLE_UTENTE"], NOW + 3600)),
    );
    manager.initialize().await;

    let err = manager
        .login(&Credentials::new("user1@example.com", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), LoginErrorKind::Rejected);
    assert_eq!(err.message("fallback"), "Credenziali non valide");
    assert!(!manager.session().is_authenticated());
    assert!(!dir.path().join(KEY).exists());
}

#[tokio::test]
async fn requests_carry_bearer_token() {
    let token = user_token(1, &["ROLE_UTENTE"], NOW + 3600);
    let (manager, clock) = manager(MemoryStore::new(), backend(token.clone()));

    let anonymous = manager
        .authorize(manager.exchange().request(Method::GET, "/hotel").unwrap())
        .build()
        .unwrap();
    assert!(anonymous.headers().get(AUTHORIZATION).is_none());

    manager.login(&credentials()).await.unwrap();
    let request = manager
        .authorize(manager.exchange().request(Method::GET, "/prenotazioni/mie").unwrap())
        .build()
        .unwrap();

    assert_eq!(request.url().path(), "/prenotazioni/mie");
    assert_eq!(
        request.headers().get(AUTHORIZATION).unwrap(),
        &format!("Bearer {token}")
    );

    // Expired sessions don't leak their token anymore
    clock.advance(3600);
    let request = manager
        .authorize(manager.exchange().request(Method::GET, "/hotel").unwrap())
        .build()
        .unwrap();
    assert!(request.headers().get(AUTHORIZATION).is_none());
}
