// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory IP blacklist with a TTL.
//!
//! Clients that present an unknown API key are blocked for `BlacklistSec`
//! seconds; every key-authenticated endpoint checks the list before doing
//! anything else. Entries expire lazily: a read of an expired entry removes
//! it.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::metrics;

/// Concurrent map of blocked IPs to their not-before release time.
pub struct Blacklist {
    ttl: Duration,
    inner: RwLock<HashMap<IpAddr, Instant>>,
}

impl Blacklist {
    /// Create a blacklist with the given block TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Add an IP to the blacklist for one TTL from now. Re-blocking an
    /// already-blocked IP restarts its TTL.
    pub fn block(&self, ip: IpAddr) {
        let until = Instant::now() + self.ttl;
        self.inner.write().unwrap().insert(ip, until);
        metrics::record_blacklist_block();
    }

    /// Whether the IP is currently blocked. Expired entries are removed on
    /// the way out.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        {
            let inner = self.inner.read().unwrap();
            match inner.get(&ip) {
                Some(until) if Instant::now() < *until => return true,
                Some(_) => {}
                None => return false,
            }
        }

        // The entry exists but expired; drop it.
        let mut inner = self.inner.write().unwrap();
        if let Some(until) = inner.get(&ip) {
            if Instant::now() < *until {
                // Re-blocked between the two locks.
                return true;
            }
            inner.remove(&ip);
        }
        false
    }

    /// Number of entries, expired ones included. Used by tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    /// Whether the blacklist holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "blacklist_tests.rs"]
mod blacklist_tests;
