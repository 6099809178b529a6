use crate::cli::{
    actions::{Action, routes, server},
    commands::{ARG_RESOLVE, CMD_ROUTES, auth, proxy},
};
use anyhow::{Context, Result};

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    if let Some(sub) = matches.subcommand_matches(CMD_ROUTES) {
        let proxy = proxy::Options::parse(sub).context("invalid proxy options")?;
        return Ok(Action::Routes(routes::Args {
            routes: proxy.routes,
            resolve: sub.get_one::<String>(ARG_RESOLVE).cloned(),
        }));
    }

    let port = matches.get_one::<u16>("port").copied().unwrap_or(3000);
    let proxy = proxy::Options::parse(matches).context("invalid proxy options")?;
    let auth = auth::Options::parse(matches).context("invalid auth options")?;

    Ok(Action::Server(server::Args {
        port,
        routes: proxy.routes,
        upstream_timeout: proxy.upstream_timeout,
        auth_url: auth.url,
        auth_timeout: auth.timeout,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use std::{path::PathBuf, time::Duration};

    fn clean_env<F: FnOnce()>(f: F) {
        temp_env::with_vars(
            [
                ("FRONTDOOR_PORT", None::<&str>),
                ("FRONTDOOR_ROUTES", None),
                ("FRONTDOOR_UPSTREAM_TIMEOUT_SECONDS", None),
                ("FRONTDOOR_AUTH_URL", None),
                ("FRONTDOOR_AUTH_TIMEOUT_SECONDS", None),
            ],
            f,
        );
    }

    #[test]
    fn server_action_with_defaults() {
        clean_env(|| {
            let matches = commands::new().get_matches_from(vec!["frontdoor"]);
            let action = handler(&matches);

            assert!(
                matches!(
                    &action,
                    Ok(Action::Server(args))
                        if args.port == 3000
                            && args.routes.is_none()
                            && args.upstream_timeout == Duration::from_secs(30)
                            && args.auth_url == "http://localhost:3001/api/auth"
                            && args.auth_timeout == Duration::from_secs(10)
                ),
                "{action:?}"
            );
        });
    }

    #[test]
    fn server_action_with_overrides() {
        clean_env(|| {
            let matches = commands::new().get_matches_from(vec![
                "frontdoor",
                "-p",
                "9000",
                "--routes",
                "table.json",
                "--auth-url",
                "https://auth.internal/api/auth",
            ]);
            let action = handler(&matches);

            assert!(
                matches!(
                    &action,
                    Ok(Action::Server(args))
                        if args.port == 9000
                            && args.routes == Some(PathBuf::from("table.json"))
                            && args.auth_url == "https://auth.internal/api/auth"
                ),
                "{action:?}"
            );
        });
    }

    #[test]
    fn rejects_non_http_auth_url() {
        clean_env(|| {
            let matches = commands::new()
                .get_matches_from(vec!["frontdoor", "--auth-url", "ftp://auth/api"]);
            let err = handler(&matches).err().map(|err| format!("{err:#}"));

            assert!(
                err.as_deref()
                    .is_some_and(|msg| msg.contains("must be an http(s) URL")),
                "{err:?}"
            );
        });
    }

    #[test]
    fn rejects_zero_upstream_timeout() {
        clean_env(|| {
            let matches = commands::new()
                .get_matches_from(vec!["frontdoor", "--upstream-timeout-seconds", "0"]);

            assert!(handler(&matches).is_err());
        });
    }

    #[test]
    fn routes_action_reads_subcommand_options() {
        clean_env(|| {
            let matches = commands::new().get_matches_from(vec![
                "frontdoor",
                "routes",
                "--routes",
                "custom.json",
                "--resolve",
                "/api/tasks/7",
            ]);
            let action = handler(&matches);

            assert!(
                matches!(
                    &action,
                    Ok(Action::Routes(args))
                        if args.routes == Some(PathBuf::from("custom.json"))
                            && args.resolve.as_deref() == Some("/api/tasks/7")
                ),
                "{action:?}"
            );
        });
    }
}
