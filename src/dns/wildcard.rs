// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Wildcard zone detection with a per-`(zone, type)` verdict cache.
//!
//! A zone carrying `*.example.com A` answers for every label under it, so a
//! refresh of any stored subdomain would copy the wildcard answer into that
//! subdomain's records. To keep the store free of those spurious copies, the
//! reconciler skips a record type entirely when the parent zone is
//! wildcarded for it.
//!
//! Detection resolves a random sibling label under the parent: if
//! `<random>.example.com` answers with records of the probed type, the zone
//! is wildcarded for that type. One probe per `(parent zone, type)` is
//! cached for a short TTL to amortize the extra DNS traffic.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::RngExt;
use tracing::debug;

use crate::constants::{
    WILDCARD_CACHE_MAX_ENTRIES, WILDCARD_CACHE_TTL_SECS, WILDCARD_PROBE_LABEL_LEN,
};
use crate::dns::resolver::{Querier, QueryError, RrType};

struct Verdict {
    wildcard: bool,
    at: Instant,
}

/// Cache of wildcard verdicts keyed by `(parent zone, type code)`.
pub struct WildcardCache {
    ttl: Duration,
    inner: Mutex<HashMap<(String, u16), Verdict>>,
}

impl Default for WildcardCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(WILDCARD_CACHE_TTL_SECS))
    }
}

impl WildcardCache {
    /// Create a cache with the given verdict TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the parent zone of `fqdn` is wildcarded for `rtype`.
    ///
    /// Probe errors count as "not wildcarded": skipping a type on a flaky
    /// probe would starve real records, while a false negative only risks
    /// one spurious record row until the next probe.
    pub async fn is_wildcard(&self, querier: &dyn Querier, fqdn: &str, rtype: RrType) -> bool {
        let Some(parent) = parent_zone(fqdn) else {
            return false;
        };

        if let Some(verdict) = self.cached(&parent, rtype) {
            return verdict;
        }

        let wildcard = probe(querier, &parent, rtype).await;
        self.remember(parent, rtype, wildcard);
        wildcard
    }

    fn cached(&self, parent: &str, rtype: RrType) -> Option<bool> {
        let mut inner = self.inner.lock().unwrap();
        let key = (parent.to_string(), rtype.code());
        match inner.get(&key) {
            Some(verdict) if verdict.at.elapsed() < self.ttl => Some(verdict.wildcard),
            Some(_) => {
                inner.remove(&key);
                None
            }
            None => None,
        }
    }

    fn remember(&self, parent: String, rtype: RrType, wildcard: bool) {
        let mut inner = self.inner.lock().unwrap();
        if inner.len() >= WILDCARD_CACHE_MAX_ENTRIES {
            let ttl = self.ttl;
            inner.retain(|_, v| v.at.elapsed() < ttl);
        }
        inner.insert(
            (parent, rtype.code()),
            Verdict {
                wildcard,
                at: Instant::now(),
            },
        );
    }

    /// Number of cached verdicts. Used by tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The zone one label up from `fqdn`, or `None` at (or above) a TLD.
fn parent_zone(fqdn: &str) -> Option<String> {
    let (_, parent) = fqdn.split_once('.')?;
    if parent.is_empty() {
        return None;
    }
    Some(parent.to_string())
}

/// One random-sibling probe against the parent zone.
async fn probe(querier: &dyn Querier, parent: &str, rtype: RrType) -> bool {
    let name = format!("{}.{parent}", random_label());
    match querier.query(rtype, &name).await {
        Ok(values) => !values.is_empty(),
        Err(QueryError::NameError) => false,
        Err(err) => {
            debug!(
                zone = parent,
                rtype = rtype.mnemonic(),
                error = %err,
                "wildcard probe failed, assuming no wildcard"
            );
            false
        }
    }
}

/// A random label that cannot collide with a real hostname in practice.
fn random_label() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..WILDCARD_PROBE_LABEL_LEN)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
#[path = "wildcard_tests.rs"]
mod wildcard_tests;
