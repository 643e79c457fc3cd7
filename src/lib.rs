// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Columbus - Passive-DNS Inventory Service
//!
//! Columbus ingests fully-qualified domain names harvested from external
//! sources (typically a Certificate Transparency scanner), stores them split
//! into `(domain, tld, sub)` label parts, and continuously re-resolves every
//! stored name across ten DNS record types.
//!
//! ## Overview
//!
//! This library provides the core functionality of the service, including:
//!
//! - The domain store (SQLite-backed, unique on the label triple)
//! - The records refresh pipeline (worker pool, samplers, cool-down gate,
//!   wildcard suppression, touch-or-append reconciliation)
//! - The lookup engine (subdomain enumeration, record history, prefix and
//!   TLD queries with a `days` freshness window)
//! - The HTTP API and HTML result pages
//!
//! ## Modules
//!
//! - [`db`] - Persistent store for domains, records and ancillary collections
//! - [`dns`] - Name handling, the DNS querier and wildcard detection
//! - [`refresh`] - The refresh scheduler and record reconciler
//! - [`lookup`] - Read queries over the store
//! - [`server`] - HTTP API, redirects and HTML pages
//!
//! ## Example
//!
//! ```rust
//! use columbus::dns::name;
//!
//! let parts = name::parts("mail.example.co.uk").unwrap();
//! assert_eq!(parts.domain, "example");
//! assert_eq!(parts.tld, "co.uk");
//! assert_eq!(parts.sub, "mail");
//! ```
//!
//! ## Features
//!
//! - **Bounded refresh** - demand-driven worker pool with non-blocking
//!   HTTP-side enqueues
//! - **Append-only history** - records are never removed, `time` marks
//!   freshness
//! - **Wildcard suppression** - per-zone wildcard verdicts keep catch-all
//!   zones from flooding the store

pub mod blacklist;
pub mod config;
pub mod constants;
pub mod context;
pub mod db;
pub mod dns;
pub mod errors;
pub mod lookup;
pub mod metrics;
pub mod refresh;
pub mod server;
pub mod stats;
pub mod version;
