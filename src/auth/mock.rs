//! Scripted `AuthClient` for tests.

use super::{AuthClient, AuthClientError, AuthFuture, AuthOutcome, Credentials};
use secrecy::ExposeSecret;
use std::sync::Mutex;

#[derive(Clone, Debug)]
pub enum Reply {
    Outcome(AuthOutcome),
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub operation: &'static str,
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug)]
pub struct MockAuthClient {
    reply: Reply,
    calls: Mutex<Vec<Call>>,
}

impl MockAuthClient {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding(set_cookies: &[&str]) -> Self {
        Self::new(Reply::Outcome(AuthOutcome::Success(super::Session::new(
            set_cookies.iter().map(|cookie| (*cookie).to_string()).collect(),
        ))))
    }

    pub fn failing(message: Option<&str>) -> Self {
        Self::new(Reply::Outcome(AuthOutcome::Failure {
            message: message.map(str::to_string),
        }))
    }

    pub fn erroring() -> Self {
        Self::new(Reply::Error)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn answer(
        &self,
        operation: &'static str,
        credentials: &Credentials,
    ) -> Result<AuthOutcome, AuthClientError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Call {
                operation,
                email: credentials.email.clone(),
                password: credentials.password.expose_secret().to_string(),
                name: credentials.name.clone(),
            });
        }

        match &self.reply {
            Reply::Outcome(outcome) => Ok(outcome.clone()),
            Reply::Error => Err(AuthClientError::Url(url::ParseError::EmptyHost)),
        }
    }
}

impl AuthClient for MockAuthClient {
    fn sign_in_email<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a> {
        Box::pin(async move { self.answer("sign_in_email", credentials) })
    }

    fn sign_up_email<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a> {
        Box::pin(async move { self.answer("sign_up_email", credentials) })
    }
}
