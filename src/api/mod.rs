use crate::{
    auth::AuthClient,
    cli::telemetry,
    proxy::{Forwarder, proxy_layer},
};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::get,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;

pub(crate) mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

use handlers::root;

/// Build the router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Assemble the full service: request-id and tracing layers around the proxy,
/// which hands anything the route table does not match to the local routes.
#[must_use]
pub fn app(forwarder: Arc<Forwarder>, auth: Arc<dyn AuthClient>) -> Router {
    let route_count = RouteCount(forwarder.table().len());

    let (router, _openapi) = router().split_for_parts();
    router
        .route("/", get(root::root))
        .fallback(root::not_found)
        .layer(Extension(auth))
        .layer(Extension(route_count))
        .layer(middleware::from_fn_with_state(forwarder, proxy_layer))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span)),
        )
}

/// Number of proxy rules, reported by `/health`.
#[derive(Clone, Copy, Debug)]
pub struct RouteCount(pub usize);

/// Start the server
/// # Errors
/// Return error if failed to bind or serve
pub async fn new(port: u16, forwarder: Arc<Forwarder>, auth: Arc<dyn AuthClient>) -> Result<()> {
    let app = app(forwarder, auth);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Gracefully shutdown");
    })
    .await?;

    telemetry::shutdown_tracer();

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
