//! External authentication client.
//!
//! The form flow depends only on the success/failure discrimination of an
//! auth call and an optional human-readable failure message. Session tokens
//! and their storage belong to the authentication service; the only piece of
//! a successful response this crate touches is the set of `Set-Cookie` values,
//! which are relayed to the browser untouched.

mod client;
#[cfg(test)]
pub(crate) mod mock;

pub use client::HttpAuthClient;

use secrecy::SecretString;
use std::{fmt, future::Future, pin::Pin};
use thiserror::Error;

/// Opaque session info returned by a successful auth call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    set_cookies: Vec<String>,
}

impl Session {
    #[must_use]
    pub fn new(set_cookies: Vec<String>) -> Self {
        Self { set_cookies }
    }

    /// Raw `Set-Cookie` values issued by the auth service.
    #[must_use]
    pub fn set_cookies(&self) -> &[String] {
        &self.set_cookies
    }
}

/// Result of an auth call that reached the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    Success(Session),
    Failure { message: Option<String> },
}

impl AuthOutcome {
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: Some(message.into()),
        }
    }
}

/// The call never produced an outcome.
#[derive(Debug, Error)]
pub enum AuthClientError {
    #[error("auth service timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("auth service unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("invalid auth service url: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for AuthClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Transport(err)
        }
    }
}

/// Email/password credentials. `name` is only sent on sign-up.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
    pub name: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

pub type AuthFuture<'a> =
    Pin<Box<dyn Future<Output = Result<AuthOutcome, AuthClientError>> + Send + 'a>>;

/// Email/password operations offered by the authentication service.
pub trait AuthClient: Send + Sync {
    fn sign_in_email<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a>;
    fn sign_up_email<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a>;
}
