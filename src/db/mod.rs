// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The persistent store.
//!
//! Collections map to SQLite tables:
//!
//! - `domains` - one row per stored FQDN, unique on `(domain, tld, sub)`
//! - `records` - the observed DNS answers per domain row. Deliberately *not*
//!   unique on `(rtype, value)`: the reconciler detects and reports a
//!   duplicate instead of having the store mask it
//! - `top_list` - per-registrable-domain lookup hit counters
//! - `not_found` - registrable domains that produced an empty lookup
//! - `ct_logs` - progress cursors written by the external CT scanner
//! - `stats` - population snapshots, trimmed to the newest 100
//! - `users` - API keys accepted by the key-authenticated endpoints
//!
//! All operations hang off [`Store`], a cheap handle over the connection
//! pool. Per-collection operations live in the sibling modules.

pub mod ctlogs;
pub mod domain;
pub mod notfound;
pub mod stats;
pub mod toplist;
pub mod users;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::dns::name;
use crate::errors::StoreError;

/// One observed DNS answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Numeric RR type code
    #[serde(rename = "type")]
    pub rtype: u16,
    /// Canonical string form of the payload
    pub value: String,
    /// Seconds since epoch when this exact `(type, value)` was last observed
    pub time: i64,
}

/// A stored FQDN with its record history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainEntry {
    /// Registrable label, e.g. `example`
    pub domain: String,
    /// Effective TLD, e.g. `co.uk`
    pub tld: String,
    /// Subdomain labels, possibly empty
    pub sub: String,
    /// Seconds since epoch of the last refresh attempt, 0 if never refreshed
    pub updated: i64,
    /// Observed records, oldest first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<DnsRecord>,
}

impl DomainEntry {
    /// The full hostname of this entry.
    #[must_use]
    pub fn fqdn(&self) -> String {
        name::fqdn_of(&self.domain, &self.tld, &self.sub)
    }
}

/// Progress cursor of an external CT-log scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerProgress {
    /// Scanner (log) name, lowercase
    pub name: String,
    /// Last processed index
    pub index: i64,
    /// Total size of the log when last seen
    pub size: i64,
}

/// One population snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
    /// Seconds since epoch when the snapshot was taken
    pub date: i64,
    /// Total number of stored FQDNs
    pub total: i64,
    /// FQDNs refreshed at least once (`updated > 0`)
    pub updated: i64,
    /// FQDNs with at least one record
    pub valid: i64,
    /// Scanner progress at snapshot time
    pub scanners: Vec<ScannerProgress>,
}

/// An API user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// The API key presented in `X-Api-Key`
    pub key: String,
    /// Unique user name
    pub name: String,
    /// Whether the user has administrative rights
    pub admin: bool,
}

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS domains (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    domain  TEXT NOT NULL,
    tld     TEXT NOT NULL,
    sub     TEXT NOT NULL,
    updated INTEGER NOT NULL DEFAULT 0
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_domains_key ON domains (domain, tld, sub);

CREATE TABLE IF NOT EXISTS records (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    domain_id INTEGER NOT NULL REFERENCES domains (id),
    rtype     INTEGER NOT NULL,
    value     TEXT NOT NULL,
    time      INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_records_lookup ON records (domain_id, rtype, value);

CREATE TABLE IF NOT EXISTS top_list (
    domain TEXT PRIMARY KEY,
    count  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS not_found (
    domain TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS ct_logs (
    name TEXT PRIMARY KEY,
    idx  INTEGER NOT NULL DEFAULT 0,
    size INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS stats (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    date     INTEGER NOT NULL,
    total    INTEGER NOT NULL,
    updated  INTEGER NOT NULL,
    valid    INTEGER NOT NULL,
    scanners TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    key   TEXT PRIMARY KEY,
    name  TEXT NOT NULL UNIQUE,
    admin INTEGER NOT NULL DEFAULT 0
);
";

/// Handle over the SQLite connection pool. Cloning is cheap.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connect to the datastore and prepare the schema.
    ///
    /// In-memory databases get a single pooled connection that never
    /// retires, so the data survives for the lifetime of the handle.
    ///
    /// # Errors
    ///
    /// Returns an error when the URI does not parse or the database is not
    /// reachable/writable.
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(uri)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = uri.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(8)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
