//! Client-side session management for the Viaggi travel storefront
//!
//! The [`SessionManager`] owns the bearer token obtained from the storefront backend, persists it
//! across restarts and derives the facts the user interface needs: whether someone is logged in,
//! with which role, and as which user. It never enforces security, it only reflects what the
//! token claims so that role-gated screens can be hidden or shown.

pub mod clock;
pub mod codec;
pub mod config;
pub mod exchange;
pub mod manager;
pub mod model;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{DecodeError, JwtCodec, TokenCodec};
pub use config::{Api, Settings};
pub use exchange::{
    CredentialExchange, Credentials, ExchangeError, HttpExchange, Registration, RegistrationError,
};
pub use manager::{LoginError, LoginErrorKind, Readiness, SessionManager, State};
pub use model::claims::{Claims, RoleClaim, UserId};
pub use model::session::{Session, SessionToken};
pub use store::{FileStore, MemoryStore, SqliteStore, Store, StoreError, TokenStore};
