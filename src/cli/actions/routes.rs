use crate::proxy::RouteTable;
use anyhow::{Context, Result};
use std::{fmt::Write as _, path::Path, path::PathBuf};

#[derive(Debug)]
pub struct Args {
    pub routes: Option<PathBuf>,
    /// `path[?query]` to resolve instead of listing the table.
    pub resolve: Option<String>,
}

/// Print the route table, or where a single path would be sent.
/// # Errors
/// Returns an error if the route table cannot be loaded.
pub fn execute(args: &Args) -> Result<()> {
    let table = load_routes(args.routes.as_deref())?;

    let output = match &args.resolve {
        Some(target) => describe(&table, target),
        None => render(&table),
    };
    println!("{output}");

    Ok(())
}

/// Load the table from `path`, or the built-in one.
/// # Errors
/// Returns an error if the file is unreadable or any rule is invalid.
pub fn load_routes(path: Option<&Path>) -> Result<RouteTable> {
    match path {
        Some(path) => RouteTable::from_file(path)
            .with_context(|| format!("failed to load route table {}", path.display())),
        None => RouteTable::builtin().context("built-in route table is invalid"),
    }
}

/// One rule per line in match order, sources aligned.
#[must_use]
pub fn render(table: &RouteTable) -> String {
    let width = table
        .rules()
        .iter()
        .map(|rule| rule.source().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (index, rule) in table.rules().iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "{:<width$}  ->  {}",
            rule.source(),
            rule.destination()
        );
    }
    out
}

#[must_use]
pub fn describe(table: &RouteTable, target: &str) -> String {
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    match table.resolve(path, query) {
        Some(resolved) => format!(
            "{target}  ->  {} (rule {})",
            resolved.destination,
            resolved.rule.source()
        ),
        None => format!("{target}  ->  local"),
    }
}
