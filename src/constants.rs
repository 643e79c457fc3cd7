// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Columbus service.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Refresh Pipeline Constants
// ============================================================================

/// Cool-down window between two refreshes of the same FQDN (1 hour)
pub const REFRESH_COOLDOWN_SECS: i64 = 3600;

/// Number of entities pulled per random-sampler iteration
pub const SAMPLE_SIZE: i64 = 1000;

/// Back-off after a store error in the random sampler (10 minutes)
pub const SAMPLER_BACKOFF_SECS: u64 = 600;

/// Idle sleep when the random sampler found nothing to enqueue
pub const SAMPLER_IDLE_SECS: u64 = 60;

/// Upper bound (exclusive) of the top-list sampler's random sleep, in hours
pub const TOP_LIST_SLEEP_MAX_HOURS: u64 = 49;

/// Interval between progress log lines for the dispatch counter
pub const PROGRESS_LOG_INTERVAL_SECS: u64 = 60;

/// Number of stripes in the per-FQDN refresh lock table
pub const REFRESH_LOCK_STRIPES: usize = 256;

// ============================================================================
// DNS Constants
// ============================================================================

/// Default DNS server port
pub const DEFAULT_DNS_PORT: u16 = 53;

/// Per-query timeout for the resolver
pub const DNS_QUERY_TIMEOUT_SECS: u64 = 5;

/// Resolver attempts per query (initial try plus retries)
pub const DNS_QUERY_ATTEMPTS: usize = 3;

/// Length of the random label used for wildcard probes
pub const WILDCARD_PROBE_LABEL_LEN: usize = 20;

/// How long a wildcard verdict stays cached per (zone, type) (10 minutes)
pub const WILDCARD_CACHE_TTL_SECS: u64 = 600;

/// Upper bound on cached wildcard verdicts before stale entries are swept
pub const WILDCARD_CACHE_MAX_ENTRIES: usize = 4096;

// ============================================================================
// Statistics Constants
// ============================================================================

/// Maximum number of entries kept in the stats collection
pub const MAX_STATS_ENTRIES: i64 = 100;

/// Lower bound of the snapshot worker's random sleep, in seconds (2 hours)
pub const STATS_SLEEP_MIN_SECS: u64 = 7200;

/// Upper bound (exclusive) of the snapshot worker's random sleep, in seconds (4 hours)
pub const STATS_SLEEP_MAX_SECS: u64 = 14400;

/// Interval between retention sweeps of the stats collection (1 hour)
pub const STATS_CLEAN_INTERVAL_SECS: u64 = 3600;

// ============================================================================
// HTTP Server Constants
// ============================================================================

/// Default listen address
pub const DEFAULT_ADDRESS: &str = ":8080";

/// Drain timeout for graceful shutdown (5 seconds)
pub const SHUTDOWN_DRAIN_SECS: u64 = 5;

/// Minimum length accepted by the `/api/starts/{prefix}` endpoint
pub const STARTS_MIN_PREFIX_LEN: usize = 5;

/// Latency threshold below which successful requests are not logged when
/// `LogErrorOnly` is set (1 second)
pub const LOG_LATENCY_THRESHOLD_MILLIS: u128 = 1000;

// ============================================================================
// Abuse Control Constants
// ============================================================================

/// Default blacklist TTL for clients that presented an unknown API key
pub const DEFAULT_BLACKLIST_SECS: u64 = 60;

// ============================================================================
// Channel Constants
// ============================================================================

/// Default capacity of the `demand` and `internal` refresh channels
pub const DEFAULT_DOMAIN_BUFFER: usize = 1000;

/// Default size of the refresh worker pool
pub const DEFAULT_DNS_WORKERS: usize = 1;

// ============================================================================
// Version Check Constants
// ============================================================================

/// GitHub repository queried by `--check`
pub const RELEASE_REPO: &str = "firestoned/columbus";

/// Base URL of the GitHub REST API
pub const GITHUB_API_BASE: &str = "https://api.github.com";
