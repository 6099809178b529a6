pub mod auth;
pub mod logging;
pub mod proxy;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const CMD_ROUTES: &str = "routes";
pub const ARG_RESOLVE: &str = "resolve";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("frontdoor")
        .about("Edge proxy and sign-in/sign-up forms")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("3000")
                .env("FRONTDOOR_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .subcommand(
            Command::new(CMD_ROUTES)
                .about("Print the route table in match order and exit")
                .arg(
                    Arg::new(ARG_RESOLVE)
                        .long(ARG_RESOLVE)
                        .value_name("PATH")
                        .help("Print where PATH (optionally with ?query) is sent instead"),
                ),
        );

    let command = proxy::with_args(command);
    let command = auth::with_args(command);
    logging::with_args(command)
}
