//! Session manager
//!
//! Owns the client session: the persisted bearer token and everything derived from it. The
//! manager is constructed explicitly and handed to whatever needs to know who is logged in.
//!
//! The session is either unauthenticated or authenticated. Orthogonal to it is the readiness
//! flag - until [`SessionManager::initialize`] completes the session is `Pending`, and consumers
//! shouldn't trust `is_authenticated` yet.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::codec::{DecodeError, JwtCodec, TokenCodec};
use crate::config::Settings;
use crate::exchange::{CredentialExchange, Credentials, ExchangeError};
use crate::model::session::{Session, SessionToken};
use crate::store::{StoreError, TokenStore};


#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error("Received token is invalid: {0}")]
    InvalidToken(#[from] DecodeError),
    #[error("Received token already expired")]
    Expired,
    #[error("Cannot persist token: {0}")]
    Storage(#[from] StoreError),
}

/// Coarse classification of login failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginErrorKind {
    /// Backend refused the credentials
    Rejected,
    /// Backend couldn't be reached
    Unavailable,
    /// Backend answered with an unusable token
    InvalidToken,
    /// Token couldn't be persisted
    Storage,
}

impl LoginError {
    pub fn kind(&self) -> LoginErrorKind {
        match self {
            Self::Exchange(ExchangeError::Rejected { .. }) => LoginErrorKind::Rejected,
            Self::Exchange(ExchangeError::Network(_) | ExchangeError::InvalidEndpoint(_)) => {
                LoginErrorKind::Unavailable
            }
            Self::Exchange(ExchangeError::EmptyToken) | Self::InvalidToken(_) | Self::Expired => {
                LoginErrorKind::InvalidToken
            }
            Self::Storage(_) => LoginErrorKind::Storage,
        }
    }

    /// Message to show to the user
    ///
    /// The backend's own explanation if it sent one, `fallback` otherwise.
    pub fn message(&self, fallback: &str) -> String {
        match self {
            Self::Exchange(err) => err.remote_message().unwrap_or(fallback).to_owned(),
            _ => fallback.to_owned(),
        }
    }
}

/// Whether the persisted session was already examined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    Pending,
    Ready,
}

/// Observable manager state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct State {
    pub readiness: Readiness,
    pub session: Session,
}

pub struct SessionManager<S, E> {
    /// Durable token slot
    store: S,
    /// Credential exchange service
    exchange: E,
    codec: Box<dyn TokenCodec>,
    clock: Arc<dyn Clock>,
    settings: Settings,
    state: watch::Sender<State>,
    /// Held while storage and published state are being updated together
    commit: Mutex<()>,
}

impl<S, E> SessionManager<S, E>
where
    S: TokenStore,
    E: CredentialExchange,
{
    /// Creates manager in the pending, unauthenticated state
    pub fn new(store: S, exchange: E, settings: Settings) -> Self {
        Self {
            store,
            exchange,
            codec: Box::new(JwtCodec),
            clock: Arc::new(SystemClock),
            settings,
            state: watch::Sender::new(State::default()),
            commit: Mutex::new(()),
        }
    }

    /// Replaces the token codec
    pub fn with_codec(mut self, codec: impl TokenCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// Replaces the time source used for expiry checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    /// Restores the session from the persisted token
    ///
    /// Invalid or expired tokens are not an error: they are removed, and the session ends up
    /// unauthenticated. Readiness is `Ready` afterwards no matter the outcome.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Session {
        let _commit = self.commit.lock().await;

        let session = match self.store.load(&self.settings.token_key).await {
            Ok(Some(token)) => {
                let token = SessionToken::new(token);
                let fingerprint = token.fingerprint();
                match self.validate(token) {
                    Ok(session) => {
                        info!(token = %fingerprint, role = ?session.role(), "Session restored");
                        session
                    }
                    Err(err) => {
                        info!(token = %fingerprint, %err, "Discarding persisted token");
                        self.clear_store().await;
                        Session::unauthenticated()
                    }
                }
            }
            Ok(None) => {
                debug!("No persisted token");
                Session::unauthenticated()
            }
            Err(err) => {
                warn!(%err, "Cannot read persisted token");
                Session::unauthenticated()
            }
        };

        self.state.send_modify(|state| {
            state.readiness = Readiness::Ready;
            state.session = session.clone();
        });
        session
    }

    /// Exchanges credentials for a token and starts an authenticated session
    ///
    /// On failure nothing changes - neither the session nor the persisted token.
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, LoginError> {
        let token = self.exchange.exchange(credentials).await?;
        let fingerprint = token.fingerprint();
        let session = self
            .validate(token.clone())
            .inspect_err(|err| warn!(token = %fingerprint, %err, "Received token rejected"))?;

        let _commit = self.commit.lock().await;
        self.store
            .save(&self.settings.token_key, token.as_str())
            .await?;
        self.state.send_modify(|state| state.session = session.clone());

        info!(token = %fingerprint, role = ?session.role(), "Logged in");
        Ok(session)
    }

    /// Forgets the session and the persisted token
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let _commit = self.commit.lock().await;
        self.clear_store().await;

        let changed = self.state.send_if_modified(|state| {
            if state.session.is_authenticated() || state.session.token().is_some() {
                state.session = Session::unauthenticated();
                true
            } else {
                false
            }
        });

        if changed {
            info!("Logged out");
        }
    }

    /// Current session
    ///
    /// Never touches the storage or the network. A session found expired is reset on the spot;
    /// its persisted token is removed on the next [`SessionManager::revalidate`], `logout` or
    /// `initialize`.
    pub fn session(&self) -> Session {
        self.expire_stale();
        self.state.borrow().session.clone()
    }

    /// Brings the persisted token in line with the current session
    ///
    /// Expires the session if needed, and once initialized, removes the persisted token of an
    /// unauthenticated session.
    #[instrument(skip(self))]
    pub async fn revalidate(&self) -> Session {
        let _commit = self.commit.lock().await;
        self.expire_stale();

        let state = self.state.borrow().clone();
        if state.readiness == Readiness::Ready && !state.session.is_authenticated() {
            self.clear_store().await;
        }
        state.session
    }

    pub fn readiness(&self) -> Readiness {
        self.state.borrow().readiness
    }

    /// Waits until the manager is initialized
    pub async fn wait_ready(&self) {
        let mut state = self.state.subscribe();
        // The sender lives in `self`, so the channel can't close while waiting
        let _ = state
            .wait_for(|state| state.readiness == Readiness::Ready)
            .await;
    }

    /// Subscribes for state changes
    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    /// Checks if the current session holds the given role
    pub fn has_role(&self, role: &str) -> bool {
        self.session().has_role(role)
    }

    /// Token to present to the backend, if logged in
    pub fn bearer(&self) -> Option<SessionToken> {
        self.session().token().cloned()
    }

    /// Attaches the bearer token to an outgoing request, if logged in
    pub fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.bearer() {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }

    /// Derives an authenticated session from the token
    fn validate(&self, token: SessionToken) -> Result<Session, LoginError> {
        let claims = self.codec.decode(token.as_str())?;
        if !claims.is_valid_at(self.clock.now()) {
            return Err(LoginError::Expired);
        }

        Ok(Session::authenticated(
            token,
            &claims,
            &self.settings.role_prefix,
        ))
    }

    /// Resets the session if it is past its expiration time
    fn expire_stale(&self) {
        let now = self.clock.now();
        self.state.send_if_modified(|state| {
            if !state.session.is_expired_at(now) {
                return false;
            }

            info!(token = ?state.session.token(), "Session expired");
            state.session = Session::unauthenticated();
            true
        });
    }

    async fn clear_store(&self) {
        if let Err(err) = self.store.remove(&self.settings.token_key).await {
            warn!(%err, "Cannot remove persisted token");
        }
    }
}
