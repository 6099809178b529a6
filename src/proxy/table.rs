//! Static route table mapping public path patterns to backend destinations.
//!
//! The table is plain ordered data: a list of `{ source, destination }` pairs
//! loaded once at startup and never mutated. Resolution walks the list in
//! declared order and the first matching rule wins.
//!
//! ## Pattern syntax
//!
//! - Exact: `/api/health` matches only that path.
//! - Wildcard: `/api/health/*` or `/api/health/:path*` matches the prefix itself
//!   and anything below it. The captured suffix replaces the placeholder at the
//!   end of the destination verbatim; an empty suffix drops the placeholder and
//!   its leading `/`.
//!
//! Exact rules and their wildcard siblings are independent entries. Nothing is
//! folded automatically, so both must be listed when both are wanted.

use serde::Deserialize;
use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use url::Url;

/// Default table shipped with the service.
const BUILTIN_ROUTES: &str = include_str!("../../routes.json");

#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("failed to read route table {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid route table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate source pattern: {0}")]
    DuplicateSource(String),
    #[error("source pattern must start with '/': {0}")]
    RelativeSource(String),
    #[error("only a trailing `*` or `:name*` segment is supported: {0}")]
    MisplacedWildcard(String),
    #[error("wildcard mismatch between source {pattern} and destination {destination}")]
    WildcardMismatch {
        pattern: String,
        destination: String,
    },
    #[error("invalid destination {destination}: {reason}")]
    InvalidDestination { destination: String, reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    source: String,
    destination: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Matcher {
    Exact(String),
    Prefix(String),
}

/// One configured forwarding rule.
#[derive(Clone, Debug)]
pub struct RouteRule {
    source: String,
    destination: String,
    matcher: Matcher,
    // Destination with the placeholder segment removed for wildcard rules.
    base: String,
}

impl RouteRule {
    fn parse(source: String, destination: String) -> Result<Self, RouteTableError> {
        if !source.starts_with('/') {
            return Err(RouteTableError::RelativeSource(source));
        }

        let source_wildcard = split_wildcard(&source)?;
        let destination_wildcard = split_wildcard(&destination)?;

        let (matcher, base) = match (source_wildcard, destination_wildcard) {
            (None, None) => (Matcher::Exact(source.clone()), destination.clone()),
            (Some((prefix, source_placeholder)), Some((base, destination_placeholder)))
                if source_placeholder == destination_placeholder =>
            {
                (Matcher::Prefix(prefix.to_string()), base.to_string())
            }
            _ => {
                return Err(RouteTableError::WildcardMismatch {
                    pattern: source,
                    destination,
                });
            }
        };

        validate_destination(&base, &destination)?;

        Ok(Self {
            source,
            destination,
            matcher,
            base,
        })
    }

    /// Source pattern as declared.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Destination URL as declared.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self.matcher, Matcher::Prefix(_))
    }

    /// Returns the destination URL when `path` matches this rule.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<String> {
        match &self.matcher {
            Matcher::Exact(exact) => (exact == path).then(|| self.base.clone()),
            Matcher::Prefix(prefix) => {
                let rest = path.strip_prefix(prefix.as_str())?;
                let suffix = if rest.is_empty() {
                    rest
                } else {
                    rest.strip_prefix('/')?
                };

                // URL parsing collapses dot segments, which would let the
                // suffix climb out of the destination's base path.
                if suffix.split(['/', '\\']).any(is_dot_segment) {
                    return None;
                }

                if suffix.is_empty() {
                    Some(self.base.clone())
                } else {
                    Some(format!("{}/{suffix}", self.base))
                }
            }
        }
    }
}

/// A path resolved against the table.
#[derive(Debug)]
pub struct Resolved<'a> {
    pub rule: &'a RouteRule,
    pub destination: String,
}

/// Ordered, immutable list of forwarding rules.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Table embedded from `routes.json`.
    ///
    /// # Errors
    /// Returns an error if the embedded table is invalid.
    pub fn builtin() -> Result<Self, RouteTableError> {
        Self::from_json(BUILTIN_ROUTES)
    }

    /// Parse a JSON array of `{ "source", "destination" }` objects.
    ///
    /// # Errors
    /// Returns an error on malformed JSON or any rule that fails validation.
    pub fn from_json(json: &str) -> Result<Self, RouteTableError> {
        let entries: Vec<RuleEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Read and parse a table file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the table is invalid.
    pub fn from_file(path: &Path) -> Result<Self, RouteTableError> {
        let json = fs::read_to_string(path).map_err(|source| RouteTableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn from_entries(entries: Vec<RuleEntry>) -> Result<Self, RouteTableError> {
        let mut seen = HashSet::with_capacity(entries.len());
        let mut rules = Vec::with_capacity(entries.len());

        for entry in entries {
            if !seen.insert(entry.source.clone()) {
                return Err(RouteTableError::DuplicateSource(entry.source));
            }
            rules.push(RouteRule::parse(entry.source, entry.destination)?);
        }

        Ok(Self { rules })
    }

    /// Rules in declared order.
    #[must_use]
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule matching `path`, with the query string carried over.
    /// `None` means the request is handled locally.
    #[must_use]
    pub fn resolve(&self, path: &str, query: Option<&str>) -> Option<Resolved<'_>> {
        self.rules.iter().find_map(|rule| {
            let mut destination = rule.matches(path)?;

            if let Some(query) = query.filter(|q| !q.is_empty()) {
                destination.push(if destination.contains('?') { '&' } else { '?' });
                destination.push_str(query);
            }

            Some(Resolved { rule, destination })
        })
    }
}

/// Split a trailing wildcard segment off a pattern.
///
/// Returns `(head, placeholder)` where `head` excludes the `/` before the
/// placeholder, or `None` for patterns without a wildcard.
fn split_wildcard(pattern: &str) -> Result<Option<(&str, &str)>, RouteTableError> {
    // Skip the scheme and authority so `http://host:8000` is not read as a
    // named segment.
    let path_start = pattern
        .find("://")
        .and_then(|scheme_end| {
            pattern[scheme_end + 3..]
                .find('/')
                .map(|slash| scheme_end + 3 + slash)
        })
        .unwrap_or(if pattern.contains("://") {
            pattern.len()
        } else {
            0
        });

    let path = &pattern[path_start..];
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len().saturating_sub(1);

    for (index, segment) in segments.iter().enumerate() {
        if is_placeholder(segment) {
            if index != last {
                return Err(RouteTableError::MisplacedWildcard(pattern.to_string()));
            }
        } else if segment.contains('*') || segment.starts_with(':') {
            return Err(RouteTableError::MisplacedWildcard(pattern.to_string()));
        }
    }

    let Some(placeholder) = segments.get(last).filter(|segment| is_placeholder(segment)) else {
        return Ok(None);
    };

    // A bare placeholder has no `/` before it.
    let head_len = pattern
        .len()
        .checked_sub(placeholder.len() + 1)
        .ok_or_else(|| RouteTableError::MisplacedWildcard(pattern.to_string()))?;
    Ok(Some((&pattern[..head_len], placeholder)))
}

/// `.` or `..`, including percent-encoded spellings such as `%2E%2e`.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// `*` or `:name*`.
fn is_placeholder(segment: &str) -> bool {
    if segment == "*" {
        return true;
    }

    segment
        .strip_prefix(':')
        .and_then(|name| name.strip_suffix('*'))
        .is_some_and(|name| {
            let mut chars = name.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn validate_destination(base: &str, destination: &str) -> Result<(), RouteTableError> {
    let invalid = |reason: String| RouteTableError::InvalidDestination {
        destination: destination.to_string(),
        reason,
    };

    let url = Url::parse(base).map_err(|err| invalid(err.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid(format!("unsupported scheme {scheme}"))),
    }

    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> RouteTable {
        match RouteTable::builtin() {
            Ok(table) => table,
            Err(err) => panic!("builtin table should parse: {err}"),
        }
    }

    #[test]
    fn builtin_table_enumerates_in_declared_order() {
        let table = builtin();
        let pairs: Vec<(&str, &str)> = table
            .rules()
            .iter()
            .map(|rule| (rule.source(), rule.destination()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("/api/health", "http://backend:8000/health"),
                ("/api/health/:path*", "http://backend:8000/health/:path*"),
                ("/api/tasks", "http://backend:8000/tasks/"),
                ("/api/tasks/:path*", "http://backend:8000/tasks/:path*"),
                ("/api/upload", "http://backend:8000/upload"),
                ("/api/transitions", "http://backend:8000/transitions"),
                ("/api/fonts", "http://backend:8000/fonts"),
                ("/api/fonts/:path*", "http://backend:8000/fonts/:path*"),
            ]
        );
    }

    #[test]
    fn exact_sources_resolve_to_exact_destinations() {
        let table = builtin();
        for rule in table.rules().iter().filter(|rule| !rule.is_wildcard()) {
            let resolved = table.resolve(rule.source(), None);
            assert_eq!(
                resolved.map(|r| r.destination),
                Some(rule.destination().to_string()),
                "{}",
                rule.source()
            );
        }
    }

    #[test]
    fn wildcard_sources_forward_suffix_verbatim() {
        let table = builtin();
        let cases = [
            ("/api/health/foo/bar", "http://backend:8000/health/foo/bar"),
            ("/api/tasks/foo/bar", "http://backend:8000/tasks/foo/bar"),
            ("/api/fonts/foo/bar", "http://backend:8000/fonts/foo/bar"),
            ("/api/tasks/42", "http://backend:8000/tasks/42"),
            (
                "/api/fonts/Noto%20Sans.ttf",
                "http://backend:8000/fonts/Noto%20Sans.ttf",
            ),
        ];

        for (path, expected) in cases {
            let resolved = table.resolve(path, None);
            assert_eq!(resolved.map(|r| r.destination).as_deref(), Some(expected));
        }
    }

    #[test]
    fn exact_rule_wins_over_wildcard_sibling() {
        let table = builtin();
        let resolved = table.resolve("/api/tasks", None);
        let Some(resolved) = resolved else {
            panic!("/api/tasks should resolve");
        };
        assert_eq!(resolved.rule.source(), "/api/tasks");
        assert_eq!(resolved.destination, "http://backend:8000/tasks/");
    }

    #[test]
    fn unmatched_paths_fall_through() {
        let table = builtin();
        for path in [
            "/",
            "/sign-in",
            "/api/auth/session",
            "/api/auth/sign-in/email",
            "/api/healthz",
            "/api/upload/extra",
            "/api/transitions/1",
            "/api",
        ] {
            assert!(table.resolve(path, None).is_none(), "{path}");
        }
    }

    #[test]
    fn dot_segments_in_wildcard_suffix_stay_local() {
        let table = builtin();
        for path in [
            "/api/tasks/../admin",
            "/api/tasks/./42",
            "/api/tasks/42/../../admin",
            "/api/fonts/%2e%2e/%2e%2e/secret",
            "/api/fonts/%2E%2E/secret",
            "/api/fonts/.%2e/secret",
            "/api/fonts/%2e/secret",
            "/api/health/..\\admin",
            "/api/health/..",
        ] {
            assert!(table.resolve(path, None).is_none(), "{path}");
        }

        // Dots inside a segment are ordinary names.
        assert_eq!(
            table
                .resolve("/api/fonts/..hidden/a.b..ttf", None)
                .map(|r| r.destination)
                .as_deref(),
            Some("http://backend:8000/fonts/..hidden/a.b..ttf")
        );
    }

    #[test]
    fn bare_placeholder_destination_is_an_error() {
        let result =
            RouteTable::from_json(r#"[{ "source": "/a/*", "destination": "*" }]"#);
        assert!(
            matches!(result, Err(RouteTableError::MisplacedWildcard(ref p)) if p == "*"),
            "{result:?}"
        );
    }

    #[test]
    fn query_string_is_carried_over() {
        let table = builtin();
        let resolved = table.resolve("/api/tasks/7", Some("verbose=1&x=2"));
        assert_eq!(
            resolved.map(|r| r.destination).as_deref(),
            Some("http://backend:8000/tasks/7?verbose=1&x=2")
        );

        let resolved = table.resolve("/api/upload", Some(""));
        assert_eq!(
            resolved.map(|r| r.destination).as_deref(),
            Some("http://backend:8000/upload")
        );
    }

    #[test]
    fn star_and_named_placeholders_are_equivalent() {
        let table = RouteTable::from_json(
            r#"[{ "source": "/files/*", "destination": "https://cdn.example.com/v1/*" }]"#,
        );
        let Ok(table) = table else {
            panic!("table should parse");
        };
        assert_eq!(
            table.resolve("/files/a/b.png", None).map(|r| r.destination),
            Some("https://cdn.example.com/v1/a/b.png".to_string())
        );
        assert_eq!(
            table.resolve("/files", None).map(|r| r.destination),
            Some("https://cdn.example.com/v1".to_string())
        );
    }

    #[test]
    fn duplicate_sources_are_rejected() {
        let result = RouteTable::from_json(
            r#"[
                { "source": "/a", "destination": "http://x/a" },
                { "source": "/a", "destination": "http://x/b" }
            ]"#,
        );
        assert!(matches!(result, Err(RouteTableError::DuplicateSource(s)) if s == "/a"));
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let cases = [
            r#"[{ "source": "api", "destination": "http://x/api" }]"#,
            r#"[{ "source": "/a/*/b", "destination": "http://x/*/b" }]"#,
            r#"[{ "source": "/a/:id", "destination": "http://x/:id" }]"#,
            r#"[{ "source": "/a/*", "destination": "http://x/a" }]"#,
            r#"[{ "source": "/a", "destination": "http://x/*" }]"#,
            r#"[{ "source": "/a/:path*", "destination": "http://x/:rest*" }]"#,
            r#"[{ "source": "/a", "destination": "ftp://x/a" }]"#,
            r#"[{ "source": "/a", "destination": "/relative" }]"#,
            r#"[{ "source": "/a", "target": "http://x/a" }]"#,
            r#"[{ "source": "/a/*", "destination": "*" }]"#,
            r#"[{ "source": "/a/:path*", "destination": ":path*" }]"#,
        ];

        for json in cases {
            assert!(RouteTable::from_json(json).is_err(), "{json}");
        }
    }

    #[test]
    fn missing_file_reports_path() {
        let result = RouteTable::from_file(Path::new("/nonexistent/frontdoor-routes.json"));
        let Err(err) = result else {
            panic!("missing file should fail");
        };
        assert!(err.to_string().contains("/nonexistent/frontdoor-routes.json"));
    }
}
