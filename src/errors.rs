// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types shared across the Columbus service.
//!
//! This module provides specialized error types for:
//! - User-facing API failures, serialized on the wire as `{"error": "…"}`
//! - Datastore failures, including the broken-invariant duplicate case
//! - Refresh pipeline failures combining store and DNS error kinds
//!
//! The HTTP layer maps [`ApiError`] variants to status codes; background
//! workers log [`RefreshError`]s and decide whether to continue based on
//! whether the underlying DNS failure is routine.

use serde::Serialize;
use thiserror::Error;

use crate::dns::resolver::QueryError;

/// User-facing errors returned by the HTTP API.
///
/// Every variant carries a stable human-readable message; JSON responses
/// serialize it as `{"error": "<message>"}` and plain-text responses send the
/// bare message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Syntactic validation of the domain name failed
    #[error("invalid domain")]
    InvalidDomain,

    /// The name decomposed to an empty registrable domain, i.e. the input is
    /// itself a public suffix (`co.uk`, `com`, …)
    #[error("domain is a public suffix")]
    PublicSuffix,

    /// The `days` query parameter was not an integer or was below `-1`
    #[error("invalid days")]
    InvalidDays,

    /// The query produced zero results
    #[error("not found")]
    NotFound,

    /// The client IP is currently on the blacklist
    #[error("blocked")]
    Blocked,

    /// The `X-Api-Key` header is missing on a key-authenticated endpoint
    #[error("missing API key")]
    MissingApiKey,

    /// The presented API key matched no user
    #[error("invalid API key")]
    InvalidApiKey,

    /// Anything the caller cannot act on: store failures, template render
    /// failures, resolver transport failures surfacing on a read path
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    /// The HTTP status code this error is surfaced with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidDomain | Self::PublicSuffix | Self::InvalidDays => 400,
            Self::MissingApiKey | Self::InvalidApiKey => 401,
            Self::Blocked => 403,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }

    /// The wire form of this error.
    #[must_use]
    pub fn wire(&self) -> WireError {
        WireError {
            error: self.to_string(),
        }
    }
}

/// JSON body for error responses: `{"error": "…"}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WireError {
    /// Human-readable error message
    pub error: String,
}

/// Errors returned by the datastore layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying SQL driver failed
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// More than one record row matched a `(type, value)` touch. The records
    /// array must never contain two entries with the same type and value, so
    /// a multi-row match means the store is corrupted.
    #[error("duplicate record for {fqdn}: type {rtype} value '{value}' matched {matched} rows")]
    DuplicateRecord {
        /// The FQDN whose records array is broken
        fqdn: String,
        /// Numeric RR type of the duplicated entry
        rtype: u16,
        /// Record payload of the duplicated entry
        value: String,
        /// Number of rows that matched
        matched: u64,
    },

    /// A stored row could not be decoded into its entity form
    #[error("failed to decode stored entity: {0}")]
    Decode(String),
}

/// Errors produced by a single `refresh_fqdn` run.
#[derive(Error, Debug)]
pub enum RefreshError {
    /// The FQDN failed syntactic validation
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    /// The FQDN has no registrable domain under the public-suffix rules
    #[error("{0} is a public suffix")]
    PublicSuffix(String),

    /// The store failed mid-refresh
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A non-routine DNS failure aborted the refresh
    #[error("query for {rtype} records failed: {source}")]
    Dns {
        /// RR type mnemonic being refreshed when the query failed
        rtype: &'static str,
        /// The underlying resolver error
        source: QueryError,
    },
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "store error on request path");
        Self::Internal
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
