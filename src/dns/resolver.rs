// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The DNS querier: one canonicalized string list per `(record type, FQDN)`.
//!
//! The refresh pipeline talks to DNS exclusively through the [`Querier`]
//! trait so tests can substitute a scripted resolver. The production
//! implementation wraps a process-wide hickory resolver, shared by every
//! worker.
//!
//! Record payloads are canonicalized to stable strings before they reach the
//! store:
//!
//! - addresses in lowercase dotted/colon form
//! - `MX` as `"<prio> <host>"`, `SRV` as `"<prio> <weight> <port> <target>"`
//! - `CNAME`/`NS`/`DNAME` as the target without the trailing dot
//! - `SOA` as one canonical string of all seven fields
//! - `TXT` as the concatenated character strings
//!
//! Equal payloads must produce byte-equal strings; the reconciler's
//! touch-or-append discipline depends on it.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{RData, RecordType};
use hickory_resolver::config::{
    NameServerConfig, NameServerConfigGroup, Protocol, ResolverConfig, ResolverOpts,
};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::TokioAsyncResolver;
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, DnsProtocol};
use crate::constants::{DNS_QUERY_ATTEMPTS, DNS_QUERY_TIMEOUT_SECS};

/// The closed set of record types tracked per FQDN.
///
/// Adding a type here is deliberate work: the refresh loop, the canonical
/// string forms and the stored numeric codes all follow this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RrType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Certificate authority authorization
    Caa,
    /// Canonical name
    Cname,
    /// Subtree delegation
    Dname,
    /// Mail exchange
    Mx,
    /// Name server
    Ns,
    /// Start of authority
    Soa,
    /// Service locator
    Srv,
    /// Text data
    Txt,
}

impl RrType {
    /// Every tracked type, in refresh order.
    pub const ALL: [Self; 10] = [
        Self::A,
        Self::Aaaa,
        Self::Caa,
        Self::Cname,
        Self::Dname,
        Self::Mx,
        Self::Ns,
        Self::Soa,
        Self::Srv,
        Self::Txt,
    ];

    /// The IANA RR type code, as stored in record rows.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Self::A => 1,
            Self::Ns => 2,
            Self::Cname => 5,
            Self::Soa => 6,
            Self::Mx => 15,
            Self::Txt => 16,
            Self::Aaaa => 28,
            Self::Srv => 33,
            Self::Dname => 39,
            Self::Caa => 257,
        }
    }

    /// The type mnemonic, e.g. `AAAA`.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Caa => "CAA",
            Self::Cname => "CNAME",
            Self::Dname => "DNAME",
            Self::Mx => "MX",
            Self::Ns => "NS",
            Self::Soa => "SOA",
            Self::Srv => "SRV",
            Self::Txt => "TXT",
        }
    }

    /// Map a stored numeric code back to the tracked type.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    fn record_type(self) -> RecordType {
        RecordType::from(self.code())
    }
}

/// The mnemonic for a stored numeric type code, or a decimal rendering for
/// codes outside the tracked set.
#[must_use]
pub fn type_name(code: u16) -> String {
    RrType::from_code(code).map_or_else(|| format!("TYPE{code}"), |t| t.mnemonic().to_string())
}

/// Errors produced by a single DNS query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The name does not exist (NXDOMAIN)
    #[error("name error")]
    NameError,

    /// The upstream server answered SERVFAIL
    #[error("server failure")]
    ServerFailure,

    /// The upstream server refused the query
    #[error("refused")]
    Refused,

    /// The query timed out after all attempts
    #[error("timeout")]
    Timeout,

    /// Any other failure; never routine-ignorable
    #[error("query failed: {0}")]
    Other(String),
}

impl QueryError {
    /// Whether the error is a routine DNS condition the background refresh
    /// may skip over (as opposed to a transport or logic failure that must
    /// surface).
    #[must_use]
    pub fn is_routine(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// A per-record-type DNS query source.
///
/// Implementations must be safe for concurrent use; one instance is shared
/// by the whole worker pool.
#[async_trait]
pub trait Querier: Send + Sync {
    /// Resolve `fqdn` for the given record type and return the canonical
    /// string form of every answer of that exact type.
    ///
    /// A name that exists but has no records of this type yields an empty
    /// vector, not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] classifying the failure.
    async fn query(&self, rtype: RrType, fqdn: &str) -> Result<Vec<String>, QueryError>;
}

/// The production querier backed by a hickory resolver.
pub struct HickoryQuerier {
    resolver: TokioAsyncResolver,
}

impl HickoryQuerier {
    /// Build the querier from the service configuration.
    ///
    /// With an empty `DNSServers` list the system resolver configuration is
    /// used; otherwise the configured servers, port and protocol.
    ///
    /// # Errors
    ///
    /// Returns an error when the system resolver configuration cannot be
    /// read.
    pub fn from_config(config: &Config) -> Result<Self, ResolveError> {
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_secs(DNS_QUERY_TIMEOUT_SECS);
        opts.attempts = DNS_QUERY_ATTEMPTS;
        // Workers must observe the zone as it is now, not a cached view.
        opts.cache_size = 0;

        let resolver_config = if config.dns_servers.is_empty() {
            let (system_config, _) = hickory_resolver::system_conf::read_system_conf()?;
            system_config
        } else {
            let protocol = match config.dns_protocol {
                DnsProtocol::Udp => Protocol::Udp,
                DnsProtocol::Tcp => Protocol::Tcp,
            };
            let mut group = NameServerConfigGroup::with_capacity(config.dns_servers.len());
            for ip in &config.dns_servers {
                group.push(NameServerConfig::new(
                    SocketAddr::new(*ip, config.dns_port),
                    protocol,
                ));
            }
            ResolverConfig::from_parts(None, Vec::new(), group)
        };

        Ok(Self {
            resolver: TokioAsyncResolver::tokio(resolver_config, opts),
        })
    }

    async fn query_once(&self, rtype: RrType, fqdn: &str) -> Result<Vec<String>, QueryError> {
        // The trailing dot keeps search-domain expansion out of the picture.
        let absolute = format!("{fqdn}.");

        let lookup = match self.resolver.lookup(absolute.as_str(), rtype.record_type()).await {
            Ok(lookup) => lookup,
            Err(err) => return map_resolve_error(&err),
        };

        let mut values = Vec::new();
        for record in lookup.record_iter() {
            // Answers may carry CNAME chain entries of other types.
            if u16::from(record.record_type()) != rtype.code() {
                continue;
            }
            let Some(data) = record.data() else {
                continue;
            };
            values.push(canonical_value(data));
        }

        Ok(values)
    }
}

#[async_trait]
impl Querier for HickoryQuerier {
    async fn query(&self, rtype: RrType, fqdn: &str) -> Result<Vec<String>, QueryError> {
        // The resolver already retries timeouts internally; one more pass
        // covers SERVFAIL, which it reports without retrying.
        match self.query_once(rtype, fqdn).await {
            Err(err @ (QueryError::ServerFailure | QueryError::Timeout)) => {
                debug!(
                    fqdn,
                    rtype = rtype.mnemonic(),
                    error = %err,
                    "transient DNS failure, retrying once"
                );
                tokio::time::sleep(Duration::from_millis(250)).await;
                self.query_once(rtype, fqdn).await
            }
            other => other,
        }
    }
}

/// Classify a resolver error, turning an empty-but-existing answer into an
/// empty value list.
fn map_resolve_error(err: &ResolveError) -> Result<Vec<String>, QueryError> {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
            // The name exists, it just has no records of this type.
            ResponseCode::NoError => Ok(Vec::new()),
            ResponseCode::NXDomain => Err(QueryError::NameError),
            ResponseCode::ServFail => Err(QueryError::ServerFailure),
            ResponseCode::Refused => Err(QueryError::Refused),
            other => Err(QueryError::Other(format!("response code {other}"))),
        },
        ResolveErrorKind::Timeout => Err(QueryError::Timeout),
        _ => Err(QueryError::Other(err.to_string())),
    }
}

/// Strip the trailing root dot from a presentation-form name.
fn trim_dot(name: &str) -> String {
    name.strip_suffix('.').unwrap_or(name).to_string()
}

/// The canonical string form of a record payload.
fn canonical_value(data: &RData) -> String {
    match data {
        RData::A(a) => a.to_string(),
        RData::AAAA(aaaa) => aaaa.to_string().to_ascii_lowercase(),
        RData::CNAME(name) => trim_dot(&name.to_utf8()),
        RData::NS(name) => trim_dot(&name.to_utf8()),
        RData::MX(mx) => format!("{} {}", mx.preference(), trim_dot(&mx.exchange().to_utf8())),
        RData::SRV(srv) => format!(
            "{} {} {} {}",
            srv.priority(),
            srv.weight(),
            srv.port(),
            trim_dot(&srv.target().to_utf8())
        ),
        RData::SOA(soa) => format!(
            "{} {} {} {} {} {} {}",
            trim_dot(&soa.mname().to_utf8()),
            trim_dot(&soa.rname().to_utf8()),
            soa.serial(),
            soa.refresh(),
            soa.retry(),
            soa.expire(),
            soa.minimum()
        ),
        RData::TXT(txt) => {
            let mut joined = String::new();
            for chunk in txt.iter() {
                joined.push_str(&String::from_utf8_lossy(chunk));
            }
            joined
        }
        // CAA, DNAME and anything exotic render through the presentation
        // form; name-valued payloads lose the trailing dot.
        other => trim_dot(&other.to_string()),
    }
}


#[cfg(test)]
#[path = "resolver_tests.rs"]
mod resolver_tests;
