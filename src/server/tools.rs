// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The `/api/tools/{action}/{fqdn}` label-extraction endpoints.
//!
//! Stateless helpers over the public-suffix rules:
//!
//! - `tld` - the effective TLD (`co.uk` for `mail.example.co.uk`)
//! - `domain` - the registrable domain (`example.co.uk`)
//! - `subdomain` - the labels below it (`mail`)
//! - `isvalid` - syntactic validity of the name

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::context::Context;
use crate::dns::name;
use crate::errors::ApiError;

use super::{reply_error, wants_plain};

fn reply_result(headers: &HeaderMap, value: &str) -> Response {
    if wants_plain(headers) {
        (StatusCode::OK, value.to_string()).into_response()
    } else {
        (StatusCode::OK, Json(json!({ "result": value }))).into_response()
    }
}

/// `GET /api/tools/{action}/{fqdn}`.
pub async fn tools_get(
    State(_ctx): State<Arc<Context>>,
    Path((action, fqdn)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    // Validity is answered for any input, even unparsable ones.
    if action == "isvalid" {
        let valid = name::is_valid(&fqdn);
        return if wants_plain(&headers) {
            (StatusCode::OK, valid.to_string()).into_response()
        } else {
            (StatusCode::OK, Json(json!({ "result": valid }))).into_response()
        };
    }

    let extract: fn(&str) -> Option<String> = match action.as_str() {
        "tld" => name::tld_of,
        "domain" => name::registrable_of,
        "subdomain" => name::sub_of,
        _ => return reply_error(&headers, &ApiError::NotFound),
    };

    if !name::is_valid(&fqdn) {
        return reply_error(&headers, &ApiError::InvalidDomain);
    }

    match extract(&name::clean(&fqdn)) {
        Some(part) if !part.is_empty() => reply_result(&headers, &part),
        _ => reply_error(&headers, &ApiError::NotFound),
    }
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tools_tests;
