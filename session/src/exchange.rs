//! Credential exchange with the storefront backend

use std::future::Future;

use derivative::Derivative;
use reqwest::{RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::Api;
use crate::model::session::SessionToken;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Request rejected with status {status}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Human readable reason provided by the backend
        message: Option<String>,
    },
    #[error("Backend unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid endpoint {0}")]
    InvalidEndpoint(String),
    #[error("Backend returned no token")]
    EmptyToken,
}

/// Registration form rejected before reaching the backend
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Passwords don't match")]
    PasswordMismatch,
}

impl ExchangeError {
    /// Reason provided by the backend, if any
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Login credentials
#[derive(Derivative, Clone, Serialize)]
#[derivative(Debug)]
pub struct Credentials {
    /// User identifier, the e-mail address
    #[serde(rename = "email")]
    pub identifier: String,
    /// User password
    #[serde(rename = "password")]
    #[derivative(Debug = "ignore")]
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

/// New user registration data
#[derive(Derivative, Clone, Serialize)]
#[derivative(Debug)]
pub struct Registration {
    #[serde(rename = "nome")]
    pub first_name: String,
    #[serde(rename = "cognome")]
    pub last_name: String,
    pub email: String,
    #[derivative(Debug = "ignore")]
    pub password: String,
}

impl Registration {
    /// Validates the form before it is sent, `confirmation` is the repeated password
    pub fn validate(&self, confirmation: &str) -> Result<(), RegistrationError> {
        if self.password != confirmation {
            return Err(RegistrationError::PasswordMismatch);
        }
        Ok(())
    }
}

/// Service exchanging credentials for a bearer token
pub trait CredentialExchange: Send + Sync {
    fn exchange(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<SessionToken, ExchangeError>> + Send;
}

/// Credential exchange over the storefront REST API
#[derive(Debug, Clone)]
pub struct HttpExchange {
    client: reqwest::Client,
    base: Url,
    api: Api,
}

impl HttpExchange {
    pub fn new(api: Api) -> Result<Self, ExchangeError> {
        let mut base = Url::parse(&api.base_url)
            .map_err(|_| ExchangeError::InvalidEndpoint(api.base_url.clone()))?;
        if base.cannot_be_a_base() {
            return Err(ExchangeError::InvalidEndpoint(api.base_url.clone()));
        }

        // Endpoint paths are joined below the base path, so it has to end with a slash
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder().timeout(api.timeout()).build()?;

        Ok(Self { client, base, api })
    }

    /// Resolves `path` below the backend root
    ///
    /// Paths are always relative to `base_url`, a leading slash doesn't escape its path:
    /// `/auth/login` on `http://host/api` is `http://host/api/auth/login`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ExchangeError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|_| ExchangeError::InvalidEndpoint(path.to_owned()))
    }

    /// Prepares a request to the backend; authorization is attached by the session manager
    pub fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<RequestBuilder, ExchangeError> {
        Ok(self.client.request(method, self.endpoint(path)?))
    }

    /// Registers a new user
    #[instrument(skip(self))]
    pub async fn register(&self, registration: &Registration) -> Result<(), ExchangeError> {
        let response = self
            .client
            .post(self.endpoint(&self.api.register_path)?)
            .json(registration)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(%status, "Registration rejected");
            return Err(ExchangeError::Rejected {
                status: status.as_u16(),
                message: remote_message(&body),
            });
        }

        debug!("User registered");
        Ok(())
    }
}

impl CredentialExchange for HttpExchange {
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier))]
    async fn exchange(&self, credentials: &Credentials) -> Result<SessionToken, ExchangeError> {
        let response = self
            .client
            .post(self.endpoint(&self.api.login_path)?)
            .json(credentials)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(%status, "Credentials rejected");
            return Err(ExchangeError::Rejected {
                status: status.as_u16(),
                message: remote_message(&body),
            });
        }

        token_from_body(&body).ok_or(ExchangeError::EmptyToken)
    }
}

/// Extracts the token from a successful login response
///
/// The backend answers either with the bare token, with a JSON string, or with a `{"token": ..}`
/// object.
fn token_from_body(body: &str) -> Option<SessionToken> {
    let body = body.trim();
    let token = match serde_json::from_str::<Value>(body) {
        Ok(Value::String(token)) => token,
        Ok(Value::Object(fields)) => fields.get("token")?.as_str()?.to_owned(),
        Ok(_) => return None,
        Err(_) => body.to_owned(),
    };

    let token = token.trim();
    (!token.is_empty() && !token.contains(char::is_whitespace)).then(|| SessionToken::new(token))
}

/// Extracts the human readable reason from an error response
fn remote_message(body: &str) -> Option<String> {
    let message = match serde_json::from_str::<Value>(body.trim()).ok()? {
        Value::String(message) => message,
        Value::Object(fields) => fields.get("message")?.as_str()?.to_owned(),
        _ => return None,
    };

    let message = message.trim();
    (!message.is_empty()).then(|| message.to_owned())
}
