// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Key-authenticated endpoints and the blacklist discipline.
//!
//! Both endpoints follow the same sequence: a blacklisted IP is rejected
//! before anything else, a missing `X-Api-Key` is a plain 401, and an
//! unknown key is a 401 that also puts the client IP on the blacklist for
//! `BlacklistSec` seconds, so the follow-up request sees 403 `blocked`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::context::Context;
use crate::db::User;
use crate::errors::ApiError;
use crate::refresh::insert_fqdn;

use super::{client_ip, reply_error};

/// Resolve the caller through the blacklist and the API-key table.
async fn authenticate(
    ctx: &Context,
    headers: &HeaderMap,
    ip: std::net::IpAddr,
) -> Result<User, ApiError> {
    if ctx.blacklist.is_blocked(ip) {
        return Err(ApiError::Blocked);
    }

    let key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if key.is_empty() {
        return Err(ApiError::MissingApiKey);
    }

    match ctx.store.user_by_key(key).await? {
        Some(user) => Ok(user),
        None => {
            ctx.blacklist.block(ip);
            Err(ApiError::InvalidApiKey)
        }
    }
}

/// `PUT /api/insert/{domain}` - feed one FQDN into the inventory.
pub async fn insert_put(
    State(ctx): State<Arc<Context>>,
    Path(domain): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let ip = client_ip(&headers, peer.ip(), &ctx.config.trusted_proxies);

    if let Err(err) = authenticate(&ctx, &headers, ip).await {
        return reply_error(&headers, &err);
    }

    match insert_fqdn(&ctx, &domain).await {
        Ok(_inserted) => StatusCode::OK.into_response(),
        Err(err) => reply_error(&headers, &err),
    }
}

/// `GET /api/user` - the caller's own user record.
pub async fn user_get(
    State(ctx): State<Arc<Context>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let ip = client_ip(&headers, peer.ip(), &ctx.config.trusted_proxies);

    match authenticate(&ctx, &headers, ip).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => reply_error(&headers, &err),
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod auth_tests;
