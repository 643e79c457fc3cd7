// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The HTTP surface.
//!
//! JSON is the default wire form; `Accept: text/plain` switches the read
//! endpoints to newline-separated text. `/search/{domain}` and `/stat`
//! serve HTML. Legacy paths redirect permanently to their `/api`
//! equivalents, except `/lookup/{domain}` which sends browsers to the HTML
//! search temporarily.
//!
//! The request log middleware honors `LogErrorOnly`: fast 2xx responses go
//! unlogged, everything else is one line with client IP, method, path,
//! status and latency. Client IPs honor `X-Forwarded-For` only when the
//! peer is a configured trusted proxy.

pub mod api;
pub mod auth;
pub mod pages;
pub mod redirect;
pub mod tools;

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tracing::{error, info};

use crate::context::Context;
use crate::errors::ApiError;
use crate::lookup::validate_days;
use crate::metrics;

/// Build the full router over the shared context.
#[must_use]
pub fn build_router(ctx: Arc<Context>) -> Router {
    Router::new()
        .route("/", get(pages::search_index))
        .route("/search/{domain}", get(pages::search_result))
        .route("/stat", get(pages::stat_page))
        .route("/api/lookup/{domain}", get(api::lookup_get))
        .route("/api/history/{domain}", get(api::history_get))
        .route("/api/starts/{prefix}", get(api::starts_get))
        .route("/api/tld/{sld}", get(api::tld_get))
        .route("/api/tools/{action}/{fqdn}", get(tools::tools_get))
        .route("/api/stat", get(api::stat_get))
        .route("/api/insert/{domain}", put(auth::insert_put))
        .route("/api/user", get(auth::user_get))
        .route("/lookup/{domain}", get(redirect::lookup_redirect))
        .route("/tld/{sld}", get(redirect::tld_redirect))
        .route("/tools/{action}/{fqdn}", get(redirect::tools_redirect))
        .route("/metrics", get(metrics_get))
        .layer(middleware::from_fn_with_state(ctx.clone(), log_requests))
        .with_state(ctx)
}

/// Serve the router until the handle is shut down.
///
/// TLS is enabled when both `SSLCert` and `SSLKey` are configured. The
/// handle is how the caller (and tests) learn the bound address and trigger
/// the graceful drain.
///
/// # Errors
///
/// Returns an error when the listen address does not parse, the TLS
/// material cannot be loaded or the listener fails.
pub async fn run(ctx: Arc<Context>, handle: Handle) -> anyhow::Result<()> {
    let addr: SocketAddr = ctx
        .config
        .listen_address()
        .parse()
        .with_context(|| format!("invalid listen address {}", ctx.config.address))?;

    let tls = ctx.config.tls_enabled();
    let app = build_router(ctx.clone()).into_make_service_with_connect_info::<SocketAddr>();

    info!(%addr, tls, "HTTP server listening");

    if tls {
        let tls_config =
            RustlsConfig::from_pem_file(&ctx.config.ssl_cert, &ctx.config.ssl_key)
                .await
                .context("failed to load TLS certificate or key")?;
        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(app)
            .await
            .context("TLS server failed")?;
    } else {
        axum_server::bind(addr)
            .handle(handle)
            .serve(app)
            .await
            .context("server failed")?;
    }

    info!("HTTP server stopped");
    Ok(())
}

async fn metrics_get() -> String {
    match metrics::gather_metrics() {
        Ok(text) => text,
        Err(err) => {
            error!(error = %err, "failed to gather metrics");
            String::from("# Error gathering metrics\n")
        }
    }
}

/// Request log middleware.
async fn log_requests(State(ctx): State<Arc<Context>>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let ip = request_ip(&ctx, &request);

    let response = next.run(request).await;

    let status = response.status();
    let latency = start.elapsed();

    let quiet = ctx.config.log_error_only
        && status.is_success()
        && latency.as_millis() < crate::constants::LOG_LATENCY_THRESHOLD_MILLIS;
    if !quiet {
        info!(
            client = %ip,
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "request"
        );
    }

    response
}

fn request_ip(ctx: &Context, request: &Request) -> IpAddr {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::from([0, 0, 0, 0]), |info| info.0.ip());
    client_ip(request.headers(), peer, &ctx.config.trusted_proxies)
}

/// Resolve the client IP: the peer address, unless the peer is a trusted
/// proxy and sent `X-Forwarded-For`, in which case the first parsable entry
/// wins.
#[must_use]
pub fn client_ip(headers: &HeaderMap, peer: IpAddr, trusted_proxies: &[IpAddr]) -> IpAddr {
    if !trusted_proxies.contains(&peer) {
        return peer;
    }

    let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) else {
        return peer;
    };

    forwarded
        .split(',')
        .map(str::trim)
        .find_map(|entry| entry.parse::<IpAddr>().ok())
        .unwrap_or(peer)
}

/// Whether the client asked for plain text.
#[must_use]
pub fn wants_plain(headers: &HeaderMap) -> bool {
    headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/plain"))
}

/// Whether the client is a browser asking for HTML.
#[must_use]
pub fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Parse the `days` query parameter; absence means `-1`.
///
/// # Errors
///
/// [`ApiError::InvalidDays`] for a non-integer or a value below `-1`.
pub fn parse_days(params: &HashMap<String, String>) -> Result<i64, ApiError> {
    let Some(raw) = params.get("days") else {
        return Ok(-1);
    };
    let days: i64 = raw.trim().parse().map_err(|_| ApiError::InvalidDays)?;
    validate_days(days)?;
    Ok(days)
}

/// An error response in the negotiated form.
pub(crate) fn reply_error(headers: &HeaderMap, err: &ApiError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if wants_plain(headers) {
        (status, err.to_string()).into_response()
    } else {
        (status, Json(err.wire())).into_response()
    }
}

/// A string-list response: JSON array, or newline-joined text.
pub(crate) fn reply_list(headers: &HeaderMap, items: &[String]) -> Response {
    if wants_plain(headers) {
        (StatusCode::OK, items.join("\n")).into_response()
    } else {
        (StatusCode::OK, Json(items)).into_response()
    }
}
