// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Service configuration parsed from a YAML file.
//!
//! The config file path is passed on the command line with `--config`. Keys
//! are `PascalCase` to stay drop-in compatible with existing deployments;
//! `MongoURI` is accepted as a legacy alias of `DatabaseURI`.
//!
//! # Example
//!
//! ```yaml
//! DatabaseURI: "sqlite:///var/lib/columbus/columbus.db"
//! Address: ":8080"
//! TrustedProxies:
//!   - "10.0.0.1"
//! DNSServers:
//!   - "9.9.9.9"
//! DNSWorker: 4
//! DomainBuffer: 1000
//! ```

use std::net::IpAddr;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_ADDRESS, DEFAULT_BLACKLIST_SECS, DEFAULT_DNS_PORT, DEFAULT_DNS_WORKERS,
    DEFAULT_DOMAIN_BUFFER,
};

/// Transport protocol used for DNS queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsProtocol {
    /// UDP transport (default)
    Udp,
    /// TCP transport
    Tcp,
}

impl Default for DnsProtocol {
    fn default() -> Self {
        Self::Udp
    }
}

/// Parsed service configuration.
///
/// All fields carry their defaults after [`Config::load`] returns, so the
/// rest of the codebase never needs to re-apply them.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Datastore connection string (required). `MongoURI` is accepted as a
    /// legacy alias.
    #[serde(rename = "DatabaseURI", alias = "MongoURI")]
    pub database_uri: String,

    /// HTTP listen address, e.g. `:8080` or `127.0.0.1:8080`
    #[serde(rename = "Address", default = "default_address")]
    pub address: String,

    /// Proxies honored for client-IP extraction via `X-Forwarded-For`
    #[serde(rename = "TrustedProxies", default)]
    pub trusted_proxies: Vec<IpAddr>,

    /// TLS certificate path; TLS is served when both this and `SSLKey` are set
    #[serde(rename = "SSLCert", default)]
    pub ssl_cert: String,

    /// TLS private key path
    #[serde(rename = "SSLKey", default)]
    pub ssl_key: String,

    /// Suppress log lines for 2xx responses faster than one second
    #[serde(rename = "LogErrorOnly", default)]
    pub log_error_only: bool,

    /// Upstream DNS server addresses; empty means the system resolver config
    #[serde(rename = "DNSServers", default)]
    pub dns_servers: Vec<IpAddr>,

    /// Upstream DNS server port
    #[serde(rename = "DNSPort", default = "default_dns_port")]
    pub dns_port: u16,

    /// DNS transport protocol
    #[serde(rename = "DNSProtocol", default)]
    pub dns_protocol: DnsProtocol,

    /// Size of the refresh worker pool
    #[serde(rename = "DNSWorker", default = "default_dns_worker")]
    pub dns_worker: usize,

    /// Capacity of the `demand` and `internal` refresh channels
    #[serde(rename = "DomainBuffer", default = "default_domain_buffer")]
    pub domain_buffer: usize,

    /// Blacklist TTL in seconds for clients with an unknown API key
    #[serde(rename = "BlacklistSec", default = "default_blacklist_sec")]
    pub blacklist_sec: u64,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_dns_port() -> u16 {
    DEFAULT_DNS_PORT
}

fn default_dns_worker() -> usize {
    DEFAULT_DNS_WORKERS
}

fn default_domain_buffer() -> usize {
    DEFAULT_DOMAIN_BUFFER
}

fn default_blacklist_sec() -> u64 {
    DEFAULT_BLACKLIST_SECS
}

impl Config {
    /// Load and validate the configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, the YAML does not
    /// parse, or a value fails validation (empty `DatabaseURI`, zero
    /// `DNSWorker`, zero `DomainBuffer`).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&raw)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw).context("failed to unmarshal config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.database_uri.is_empty() {
            bail!("DatabaseURI is empty");
        }
        if self.dns_worker == 0 {
            bail!("DNSWorker must be at least 1");
        }
        if self.domain_buffer == 0 {
            bail!("DomainBuffer must be at least 1");
        }
        if self.blacklist_sec == 0 {
            bail!("BlacklistSec must be at least 1");
        }
        if self.ssl_cert.is_empty() != self.ssl_key.is_empty() {
            bail!("SSLCert and SSLKey must be set together");
        }
        Ok(())
    }

    /// Whether TLS serving is configured.
    #[must_use]
    pub fn tls_enabled(&self) -> bool {
        !self.ssl_cert.is_empty() && !self.ssl_key.is_empty()
    }

    /// The listen address in `host:port` form. A bare `:port` value binds
    /// every interface.
    #[must_use]
    pub fn listen_address(&self) -> String {
        if self.address.starts_with(':') {
            format!("0.0.0.0{}", self.address)
        } else {
            self.address.clone()
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
