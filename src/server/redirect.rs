// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Legacy-path redirects.
//!
//! `/tld` and `/tools` moved under `/api` permanently. `/lookup` depends on
//! the caller: browsers are sent to the HTML search page with a temporary
//! redirect, everything else permanently to `/api/lookup`.

use axum::extract::{Path, Query};
use axum::http::HeaderMap;
use axum::response::Redirect;
use std::collections::HashMap;

use super::wants_html;

/// `GET /lookup/{domain}`.
pub async fn lookup_redirect(
    Path(domain): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Redirect {
    if wants_html(&headers) {
        return Redirect::temporary(&format!("/search/{domain}"));
    }

    let mut target = format!("/api/lookup/{domain}");
    if let Some(days) = params.get("days") {
        target.push_str(&format!("?days={days}"));
    }
    Redirect::permanent(&target)
}

/// `GET /tld/{sld}`.
pub async fn tld_redirect(Path(sld): Path<String>) -> Redirect {
    Redirect::permanent(&format!("/api/tld/{sld}"))
}

/// `GET /tools/{action}/{fqdn}`.
pub async fn tools_redirect(Path((action, fqdn)): Path<(String, String)>) -> Redirect {
    Redirect::permanent(&format!("/api/tools/{action}/{fqdn}"))
}
