use crate::{
    api,
    auth::{AuthClient, HttpAuthClient},
    cli::actions::routes::load_routes,
    proxy::Forwarder,
};
use anyhow::{Context, Result};
use std::{fmt::Write as _, path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub routes: Option<PathBuf>,
    pub upstream_timeout: Duration,
    pub auth_url: String,
    pub auth_timeout: Duration,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the route table is invalid, a client cannot be built, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let table = load_routes(args.routes.as_deref())?;
    let forwarder = Forwarder::new(table, args.upstream_timeout)
        .context("Failed to build upstream HTTP client")?;

    let auth: Arc<dyn AuthClient> = Arc::new(
        HttpAuthClient::new(&args.auth_url, args.auth_timeout)
            .context("Failed to build authentication client")?,
    );

    api::new(args.port, Arc::new(forwarder), auth).await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        (
            "routes",
            args.routes
                .as_ref()
                .map_or_else(|| "built-in".to_string(), |path| path.display().to_string()),
        ),
        (
            "upstream_timeout",
            format!("{}s", args.upstream_timeout.as_secs()),
        ),
        ("auth_url", args.auth_url.clone()),
        ("auth_timeout", format!("{}s", args.auth_timeout.as_secs())),
    ];
    info!("{}", startup_message(&entries));
}

fn startup_message(entries: &[(&str, String)]) -> String {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "frontdoor - {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ = write!(message, "\n  {key}:{padding} {value}");
    }
    message
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_message_aligns_values() {
        let message = startup_message(&[
            ("listen", "tcp:3000".to_string()),
            ("auth_url", "http://localhost:3001/api/auth".to_string()),
        ]);

        assert!(message.starts_with(&format!("frontdoor - {}", env!("CARGO_PKG_VERSION"))));
        assert!(message.contains("\n  listen:   tcp:3000"));
        assert!(message.contains("\n  auth_url: http://localhost:3001/api/auth"));
    }

    #[test]
    fn short_commit_truncates() {
        assert_eq!(short_commit("0123456789abcdef"), "0123456");
        assert_eq!(short_commit(" abc "), "abc");
    }

    #[tokio::test]
    async fn invalid_route_file_fails_before_binding() {
        let result = execute(Args {
            port: 0,
            routes: Some(PathBuf::from("/nonexistent/routes.json")),
            upstream_timeout: Duration::from_secs(1),
            auth_url: "http://localhost:3001/api/auth".to_string(),
            auth_timeout: Duration::from_secs(1),
        })
        .await;

        assert!(result.is_err());
    }
}
