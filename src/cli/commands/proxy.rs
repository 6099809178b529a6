use clap::{Arg, ArgMatches, Command};
use std::{path::PathBuf, time::Duration};

pub const ARG_ROUTES: &str = "route-table";
pub const ARG_UPSTREAM_TIMEOUT_SECONDS: &str = "upstream-timeout-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    /// `None` selects the built-in table.
    pub routes: Option<PathBuf>,
    pub upstream_timeout: Duration,
}

impl Options {
    /// Parse proxy arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the upstream timeout is zero.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let routes = matches
            .get_one::<String>(ARG_ROUTES)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let seconds = matches
            .get_one::<u64>(ARG_UPSTREAM_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(30);
        if seconds == 0 {
            anyhow::bail!("--{ARG_UPSTREAM_TIMEOUT_SECONDS} must be greater than zero");
        }

        Ok(Self {
            routes,
            upstream_timeout: Duration::from_secs(seconds),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ROUTES)
                .long("routes")
                .value_name("FILE")
                .help("Route table JSON file (default: built-in table)")
                .long_help(
                    "Route table JSON file: an array of {\"source\", \"destination\"} objects, matched in order.\n\nSources are exact paths or end in a `*` or `:name*` wildcard segment. Without this option the built-in table is used.",
                )
                .env("FRONTDOOR_ROUTES")
                .global(true),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_TIMEOUT_SECONDS)
                .long(ARG_UPSTREAM_TIMEOUT_SECONDS)
                .help("Read timeout for proxied requests in seconds")
                .env("FRONTDOOR_UPSTREAM_TIMEOUT_SECONDS")
                .default_value("30")
                .value_parser(clap::value_parser!(u64)),
        )
}
