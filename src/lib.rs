//! # Frontdoor
//!
//! `frontdoor` is the edge service in front of the application backend and the
//! authentication service. It does two things:
//!
//! ## Route proxy
//!
//! A fixed, ordered table of `source -> destination` rules decides which
//! incoming paths are forwarded to the backend. A rule is either an exact path
//! (`/api/tasks`) or a path with a trailing wildcard segment
//! (`/api/tasks/:path*`) whose captured suffix is appended verbatim to the
//! destination. Exact and wildcard forms of the same endpoint are separate
//! rules. Anything the table does not match is served locally.
//!
//! ## Sign-in and sign-up forms
//!
//! Both forms share one state machine (`Idle -> Submitting -> Succeeded |
//! Failed`) parametrized by an [`forms::AuthFormConfig`]. Submissions call the
//! authentication service over HTTP; on success the service's session cookies
//! are relayed and the browser is sent home after a short delay.

pub mod api;
pub mod auth;
pub mod cli;
pub mod forms;
pub mod proxy;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
