//! Request forwarding for paths matched by the route table.
//!
//! `proxy_layer` runs in front of the local router. A request whose path
//! resolves against the table is streamed to the destination and the upstream
//! response is streamed back; every other request goes to the local router
//! untouched.

use super::table::RouteTable;
use axum::{
    body::{Body, HttpBody},
    extract::{ConnectInfo, Request, State},
    http::{
        HeaderMap, HeaderName, HeaderValue, StatusCode,
        header::{CONNECTION, CONTENT_LENGTH, HOST},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use reqwest::{Client, redirect::Policy};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, error, instrument};

const CONNECT_TIMEOUT_SECONDS: u64 = 10;

/// Headers scoped to a single connection; never forwarded in either direction.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("upstream timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("upstream unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
}

impl From<reqwest::Error> for ForwardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Unreachable(err)
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Unreachable(_) => StatusCode::BAD_GATEWAY,
        };

        (status, status.canonical_reason().unwrap_or("Upstream error")).into_response()
    }
}

/// Route table plus the HTTP client used to reach destinations.
#[derive(Debug)]
pub struct Forwarder {
    table: RouteTable,
    client: Client,
}

impl Forwarder {
    /// Build a forwarder. `read_timeout` bounds each wait on the upstream.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(table: RouteTable, read_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(Policy::none())
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECONDS))
            .read_timeout(read_timeout)
            .build()?;

        Ok(Self { table, client })
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Send `request` to `destination` and stream the upstream response back.
    ///
    /// # Errors
    /// Returns an error if the upstream cannot be reached or times out.
    #[instrument(skip(self, request), fields(method = %request.method()))]
    pub async fn forward(
        &self,
        destination: &str,
        request: Request,
    ) -> Result<Response, ForwardError> {
        let (parts, body) = request.into_parts();

        let mut headers = without_hop_by_hop(&parts.headers);
        headers.remove(HOST);

        if let Some(host) = parts.headers.get(HOST) {
            headers.insert(HeaderName::from_static("x-forwarded-host"), host.clone());
        }
        headers.insert(
            HeaderName::from_static("x-forwarded-proto"),
            HeaderValue::from_static(if parts.uri.scheme_str() == Some("https") {
                "https"
            } else {
                "http"
            }),
        );

        if let Some(ConnectInfo(peer)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            append_forwarded_for(&mut headers, peer);
        }

        let mut upstream_request = self.client.request(parts.method, destination);

        if !body.is_end_stream() {
            if let Some(length) = body.size_hint().exact()
                && !headers.contains_key(CONTENT_LENGTH)
            {
                headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
            }
            upstream_request = upstream_request.body(reqwest::Body::wrap_stream(
                body.into_data_stream(),
            ));
        }

        let upstream = upstream_request.headers(headers).send().await?;

        debug!(status = %upstream.status(), "upstream responded");

        let status = upstream.status();
        let response_headers = without_hop_by_hop(upstream.headers());

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;

        Ok(response)
    }
}

/// Middleware: forward table matches, hand everything else to `next`.
pub async fn proxy_layer(
    State(forwarder): State<Arc<Forwarder>>,
    request: Request,
    next: Next,
) -> Response {
    let resolved = forwarder
        .table()
        .resolve(request.uri().path(), request.uri().query())
        .map(|resolved| (resolved.rule.source().to_string(), resolved.destination));

    let Some((source, destination)) = resolved else {
        return next.run(request).await;
    };

    debug!(rule = %source, %destination, "forwarding request");

    match forwarder.forward(&destination, request).await {
        Ok(response) => response,
        Err(err) => {
            error!(rule = %source, %destination, "Failed to forward request: {}", err);
            err.into_response()
        }
    }
}

/// Copy `headers` without hop-by-hop entries, including any named in `Connection`.
fn without_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let connection_listed: Vec<String> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name_str = name.as_str();
        if HOP_BY_HOP.contains(&name_str) || connection_listed.iter().any(|n| n == name_str) {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }

    filtered
}

fn append_forwarded_for(headers: &mut HeaderMap, peer: &SocketAddr) {
    let name = HeaderName::from_static("x-forwarded-for");
    let ip = peer.ip().to_string();

    let value = match headers.get(&name).and_then(|v| v.to_str().ok()) {
        Some(existing) if !existing.trim().is_empty() => format!("{existing}, {ip}"),
        _ => ip,
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(name, value);
    }
}
