// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The JSON/plain read endpoints under `/api`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::constants::STARTS_MIN_PREFIX_LEN;
use crate::context::Context;
use crate::errors::ApiError;
use crate::lookup;
use crate::metrics;

use super::{parse_days, reply_error, reply_list, wants_plain};

/// `GET /api/lookup/{domain}?days=N` - subdomain labels.
pub async fn lookup_get(
    State(ctx): State<Arc<Context>>,
    Path(domain): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let days = match parse_days(&params) {
        Ok(days) => days,
        Err(err) => return reply_error(&headers, &err),
    };

    match lookup::lookup(&ctx, &domain, days).await {
        Ok(subs) if subs.is_empty() => {
            metrics::record_lookup("lookup", false);
            lookup::note_miss(&ctx, &domain).await;
            reply_error(&headers, &ApiError::NotFound)
        }
        Ok(subs) => {
            metrics::record_lookup("lookup", true);
            lookup::note_hit(&ctx, &domain).await;
            reply_list(&headers, &subs)
        }
        Err(err) => reply_error(&headers, &err),
    }
}

/// `GET /api/history/{domain}?days=N` - the record history of one exact
/// FQDN.
pub async fn history_get(
    State(ctx): State<Arc<Context>>,
    Path(fqdn): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let days = match parse_days(&params) {
        Ok(days) => days,
        Err(err) => return reply_error(&headers, &err),
    };

    match lookup::records(&ctx, &fqdn, days).await {
        Ok(records) if records.is_empty() => {
            metrics::record_lookup("history", false);
            lookup::note_miss(&ctx, &fqdn).await;
            reply_error(&headers, &ApiError::NotFound)
        }
        Ok(records) => {
            metrics::record_lookup("history", true);
            lookup::note_hit(&ctx, &fqdn).await;
            if wants_plain(&headers) {
                let lines: Vec<String> = records
                    .iter()
                    .map(|r| format!("{} {} {}", r.time, r.rtype, r.value))
                    .collect();
                (StatusCode::OK, lines.join("\n")).into_response()
            } else {
                (StatusCode::OK, Json(records)).into_response()
            }
        }
        Err(err) => reply_error(&headers, &err),
    }
}

/// `GET /api/starts/{prefix}` - registrable labels starting with the
/// prefix. The prefix must be at least five characters.
pub async fn starts_get(
    State(ctx): State<Arc<Context>>,
    Path(prefix): Path<String>,
    headers: HeaderMap,
) -> Response {
    if prefix.len() < STARTS_MIN_PREFIX_LEN {
        return reply_error(&headers, &ApiError::InvalidDomain);
    }

    match lookup::starts(&ctx, &prefix).await {
        Ok(domains) if domains.is_empty() => {
            metrics::record_lookup("starts", false);
            reply_error(&headers, &ApiError::NotFound)
        }
        Ok(domains) => {
            metrics::record_lookup("starts", true);
            reply_list(&headers, &domains)
        }
        Err(err) => reply_error(&headers, &err),
    }
}

/// `GET /api/tld/{sld}` - TLDs observed for a second-level label.
pub async fn tld_get(
    State(ctx): State<Arc<Context>>,
    Path(sld): Path<String>,
    headers: HeaderMap,
) -> Response {
    match lookup::tlds(&ctx, &sld).await {
        Ok(tlds) if tlds.is_empty() => {
            metrics::record_lookup("tld", false);
            reply_error(&headers, &ApiError::NotFound)
        }
        Ok(tlds) => {
            metrics::record_lookup("tld", true);
            reply_list(&headers, &tlds)
        }
        Err(err) => reply_error(&headers, &err),
    }
}

/// `GET /api/stat` - the newest statistics snapshot.
pub async fn stat_get(State(ctx): State<Arc<Context>>, headers: HeaderMap) -> Response {
    match ctx.store.newest_stat().await {
        Ok(Some(entry)) => (StatusCode::OK, Json(entry)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => reply_error(&headers, &err.into()),
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
