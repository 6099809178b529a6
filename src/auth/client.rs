use super::{AuthClient, AuthClientError, AuthFuture, AuthOutcome, Credentials, Session};
use crate::APP_USER_AGENT;
use reqwest::{Client, header::SET_COOKIE};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const SIGN_IN_EMAIL: &str = "sign-in/email";
const SIGN_UP_EMAIL: &str = "sign-up/email";

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// `AuthClient` speaking JSON over HTTP to the authentication service.
///
/// `POST {base}/sign-in/email` and `POST {base}/sign-up/email`; any 2xx is a
/// success, any other status a failure carrying the body's `message` field.
#[derive(Clone, Debug)]
pub struct HttpAuthClient {
    base: Url,
    client: Client,
}

impl HttpAuthClient {
    /// # Errors
    /// Returns an error if `base_url` is not a valid URL or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AuthClientError> {
        // Without a trailing slash `Url::join` would replace the last segment.
        let base = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { base, client })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    #[instrument(skip(self, payload))]
    async fn post(&self, endpoint: &str, payload: Value) -> Result<AuthOutcome, AuthClientError> {
        let url = self.base.join(endpoint)?;

        let response = self.client.post(url).json(&payload).send().await?;
        let status = response.status();

        if status.is_success() {
            let set_cookies = response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok().map(str::to_string))
                .collect();

            debug!(%status, "auth call succeeded");

            return Ok(AuthOutcome::Success(Session::new(set_cookies)));
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message.filter(|message| !message.trim().is_empty()),
            Err(err) => {
                debug!("auth error body is not JSON: {}", err);
                None
            }
        };

        warn!(%status, "auth call rejected");

        Ok(AuthOutcome::Failure { message })
    }
}

impl AuthClient for HttpAuthClient {
    fn sign_in_email<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a> {
        Box::pin(async move {
            let payload = json!({
                "email": credentials.email,
                "password": credentials.password.expose_secret(),
            });
            self.post(SIGN_IN_EMAIL, payload).await
        })
    }

    fn sign_up_email<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a> {
        Box::pin(async move {
            let payload = json!({
                "email": credentials.email,
                "password": credentials.password.expose_secret(),
                "name": credentials.name.as_deref().unwrap_or_default(),
            });
            self.post(SIGN_UP_EMAIL, payload).await
        })
    }
}
