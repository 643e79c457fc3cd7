// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The HTML pages: the search form, search results and statistics.
//!
//! Pages are rendered from embedded handlebars templates; failures fall
//! back to small static error pages so the HTML surface never leaks
//! internals.

use std::sync::{Arc, LazyLock};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use handlebars::Handlebars;
use serde_json::json;
use tracing::error;

use crate::context::Context;
use crate::db::StatEntry;
use crate::dns::resolver::type_name;
use crate::errors::ApiError;
use crate::lookup;
use crate::metrics;

static INDEX_HTML: &str = include_str!("templates/index.html");
static BAD_REQUEST_HTML: &str = include_str!("templates/bad_request.html");
static NOT_FOUND_HTML: &str = include_str!("templates/not_found.html");
static SERVER_ERROR_HTML: &str = include_str!("templates/server_error.html");

static TEMPLATES: LazyLock<Handlebars<'static>> = LazyLock::new(|| {
    let mut handlebars = Handlebars::new();
    handlebars
        .register_template_string(
            "search_result",
            include_str!("templates/search_result.hbs"),
        )
        .unwrap();
    handlebars
        .register_template_string("stat", include_str!("templates/stat.hbs"))
        .unwrap();
    handlebars
});

/// `GET /` - the search form.
pub async fn search_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /search/{domain}` - HTML rendering of the full lookup with
/// per-FQDN records.
pub async fn search_result(State(ctx): State<Arc<Context>>, Path(domain): Path<String>) -> Response {
    let fqdns = match lookup::lookup_full(&ctx, &domain, -1).await {
        Ok(fqdns) => fqdns,
        Err(ApiError::InvalidDomain | ApiError::PublicSuffix | ApiError::InvalidDays) => {
            return (StatusCode::BAD_REQUEST, Html(BAD_REQUEST_HTML)).into_response();
        }
        Err(err) => {
            error!(domain, error = %err, "search lookup failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_HTML)).into_response();
        }
    };

    if fqdns.is_empty() {
        metrics::record_lookup("search", false);
        lookup::note_miss(&ctx, &domain).await;
        return (StatusCode::NOT_FOUND, Html(NOT_FOUND_HTML)).into_response();
    }

    metrics::record_lookup("search", true);
    lookup::note_hit(&ctx, &domain).await;

    let mut known = Vec::new();
    let mut unknowns = Vec::new();
    for fqdn in &fqdns {
        // days=0: only names that have records render a table; the rest are
        // listed as unresolved.
        let records = match lookup::records(&ctx, fqdn, 0).await {
            Ok(records) => records,
            Err(err) => {
                error!(fqdn, error = %err, "failed to load records for search page");
                return (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_HTML))
                    .into_response();
            }
        };

        if records.is_empty() {
            unknowns.push(fqdn.clone());
        } else {
            let rows: Vec<serde_json::Value> = records
                .iter()
                .map(|r| {
                    json!({
                        "type": type_name(r.rtype),
                        "value": r.value,
                        "time": format_time(r.time),
                    })
                })
                .collect();
            known.push(json!({ "fqdn": fqdn, "records": rows }));
        }
    }

    let data = json!({
        "question": domain,
        "domains": known,
        "unknowns": unknowns,
    });

    match TEMPLATES.render("search_result", &data) {
        Ok(body) => Html(body).into_response(),
        Err(err) => {
            error!(error = %err, "failed to render search page");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_HTML)).into_response()
        }
    }
}

/// `GET /stat` - the HTML statistics page.
pub async fn stat_page(State(ctx): State<Arc<Context>>) -> Response {
    let entry = match ctx.store.newest_stat().await {
        Ok(entry) => entry,
        Err(err) => {
            error!(error = %err, "failed to load newest stat");
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_HTML)).into_response();
        }
    };

    let data = match entry {
        Some(entry) => stat_view(&entry),
        None => json!({ "empty": true }),
    };

    match TEMPLATES.render("stat", &data) {
        Ok(body) => Html(body).into_response(),
        Err(err) => {
            error!(error = %err, "failed to render stat page");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_HTML)).into_response()
        }
    }
}

/// Build the template data for one snapshot.
fn stat_view(entry: &StatEntry) -> serde_json::Value {
    let mut scanners: Vec<(f64, serde_json::Value)> = entry
        .scanners
        .iter()
        .map(|s| {
            let percent = percent_of(s.index, s.size);
            let view = json!({
                "name": s.name,
                "index": format_thousands(s.index),
                "size": format_thousands(s.size),
                "remaining": format_thousands((s.size - s.index).max(0)),
                "complete": format!("{percent:.2}%"),
            });
            (percent, view)
        })
        .collect();
    scanners.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let ct_total: i64 = entry.scanners.iter().map(|s| s.size).sum();

    json!({
        "empty": false,
        "date": format_time(entry.date),
        "total": format_thousands(entry.total),
        "updated": format_thousands(entry.updated),
        "updated_percent": format!("{:.2}%", percent_of(entry.updated, entry.total)),
        "valid": format_thousands(entry.valid),
        "valid_percent": format!("{:.2}%", percent_of(entry.valid, entry.total)),
        "ct_total": format_thousands(ct_total),
        "scanners": scanners.into_iter().map(|(_, view)| view).collect::<Vec<_>>(),
    })
}

fn percent_of(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Render seconds-since-epoch as a UTC timestamp.
fn format_time(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Group digits in thousands: `1234567` → `1,234,567`.
fn format_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
#[path = "pages_tests.rs"]
mod pages_tests;
