use clap::{Arg, ArgMatches, Command};
use std::time::Duration;
use url::Url;

pub const ARG_AUTH_URL: &str = "auth-url";
pub const ARG_AUTH_TIMEOUT_SECONDS: &str = "auth-timeout-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub url: String,
    pub timeout: Duration,
}

impl Options {
    /// Parse auth service arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the URL is missing, not http(s), or the timeout is zero.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let url = match matches.get_one::<String>(ARG_AUTH_URL) {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => anyhow::bail!("missing required argument: --{ARG_AUTH_URL}"),
        };

        let parsed = Url::parse(&url)
            .map_err(|err| anyhow::anyhow!("invalid --{ARG_AUTH_URL} '{url}': {err}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("--{ARG_AUTH_URL} must be an http(s) URL, got '{url}'");
        }

        let seconds = matches
            .get_one::<u64>(ARG_AUTH_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(10);
        if seconds == 0 {
            anyhow::bail!("--{ARG_AUTH_TIMEOUT_SECONDS} must be greater than zero");
        }

        Ok(Self {
            url,
            timeout: Duration::from_secs(seconds),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AUTH_URL)
                .long(ARG_AUTH_URL)
                .help("Authentication service base URL")
                .long_help(
                    "Authentication service base URL. Sign-in posts to `<url>/sign-in/email`, sign-up to `<url>/sign-up/email`.",
                )
                .env("FRONTDOOR_AUTH_URL")
                .default_value("http://localhost:3001/api/auth"),
        )
        .arg(
            Arg::new(ARG_AUTH_TIMEOUT_SECONDS)
                .long(ARG_AUTH_TIMEOUT_SECONDS)
                .help("Timeout for authentication calls in seconds")
                .env("FRONTDOOR_AUTH_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64)),
        )
}
