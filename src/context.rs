// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for workers and HTTP handlers.
//!
//! One [`Context`] is built at startup and passed as `Arc<Context>` to every
//! background worker and request handler. It carries the store handle, the
//! DNS querier, the wildcard cache, the two refresh channels, the blacklist
//! and the parsed configuration; nothing in the service lives in a global.
//!
//! The refresh channels:
//! - `demand` - fed by lookup hits and first-time inserts; sends never block
//!   (a full channel drops the token and bumps a metric)
//! - `internal` - fed by the samplers; sends block so the samplers throttle
//!   to the pool's drain rate

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_channel::{Receiver, Sender, TrySendError};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::blacklist::Blacklist;
use crate::config::Config;
use crate::constants::REFRESH_LOCK_STRIPES;
use crate::db::Store;
use crate::dns::resolver::Querier;
use crate::dns::wildcard::WildcardCache;
use crate::metrics;

/// Seconds since the Unix epoch.
#[must_use]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Striped lock table keyed by FQDN.
///
/// Guarantees at most one concurrent refresh per FQDN in this process, which
/// closes the touch-then-append race window without a lock per stored name.
pub struct LockTable {
    stripes: Vec<Mutex<()>>,
}

impl LockTable {
    /// Create a table with the given number of stripes.
    #[must_use]
    pub fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Acquire the stripe covering `key`, waiting if it is held.
    pub async fn lock(&self, key: &str) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = usize::try_from(hasher.finish() % self.stripes.len() as u64)
            .unwrap_or_default();
        self.stripes[index].lock().await
    }
}

/// Shared service state.
pub struct Context {
    /// Parsed configuration
    pub config: Config,

    /// The persistent store
    pub store: Store,

    /// Process-wide DNS querier, safe for concurrent use
    pub querier: Arc<dyn Querier>,

    /// Wildcard verdict cache
    pub wildcards: WildcardCache,

    /// TTL'd IP blacklist
    pub blacklist: Blacklist,

    /// Demand-channel sender (HTTP edge, non-blocking)
    pub demand_tx: Sender<String>,
    /// Demand-channel receiver (worker pool)
    pub demand_rx: Receiver<String>,

    /// Internal-channel sender (samplers, blocking)
    pub internal_tx: Sender<String>,
    /// Internal-channel receiver (worker pool)
    pub internal_rx: Receiver<String>,

    /// Per-FQDN refresh locks
    pub refresh_locks: LockTable,

    /// Monotonic count of FQDNs handed to the reconciler
    pub dispatched: AtomicU64,
}

impl Context {
    /// Assemble the shared context from its parts.
    #[must_use]
    pub fn new(config: Config, store: Store, querier: Arc<dyn Querier>) -> Arc<Self> {
        let (demand_tx, demand_rx) = async_channel::bounded(config.domain_buffer);
        let (internal_tx, internal_rx) = async_channel::bounded(config.domain_buffer);

        Arc::new(Self {
            blacklist: Blacklist::new(Duration::from_secs(config.blacklist_sec)),
            config,
            store,
            querier,
            wildcards: WildcardCache::default(),
            demand_tx,
            demand_rx,
            internal_tx,
            internal_rx,
            refresh_locks: LockTable::new(REFRESH_LOCK_STRIPES),
            dispatched: AtomicU64::new(0),
        })
    }

    /// Non-blocking enqueue to the demand channel.
    ///
    /// Returns `true` when the token was accepted. A full channel drops the
    /// token silently apart from the `demand_dropped_total` metric; request
    /// latency must never depend on the DNS backlog.
    pub fn enqueue_demand(&self, token: &str) -> bool {
        match self.demand_tx.try_send(token.to_string()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                metrics::record_demand_dropped();
                debug!(token, "demand channel full, dropping token");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}


#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
