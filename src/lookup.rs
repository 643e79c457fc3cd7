// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The lookup engine: read queries over the store.
//!
//! All reads accept a `days` freshness window:
//!
//! - `-1` - everything, records or not
//! - `0` - only entities that have at least one record, of any age
//! - `> 0` - only entities with at least one record observed within the
//!   last `days` days
//! - below `-1` - invalid
//!
//! Reads are pure; the hit/miss side effects (demand enqueue, top-list
//! bump, not-found record) are exposed as [`note_hit`] and [`note_miss`] so
//! every HTTP surface counts a query exactly once, no matter how many
//! engine calls it makes.

use tracing::warn;

use crate::context::{unix_now, Context};
use crate::db::{DnsRecord, DomainEntry};
use crate::dns::name;
use crate::errors::ApiError;

/// Reject `days` values below `-1`.
///
/// # Errors
///
/// [`ApiError::InvalidDays`] when out of range.
pub fn validate_days(days: i64) -> Result<(), ApiError> {
    if days < -1 {
        return Err(ApiError::InvalidDays);
    }
    Ok(())
}

/// Whether an entity passes the `days` window.
fn entity_in_window(entry: &DomainEntry, days: i64, now: i64) -> bool {
    match days {
        -1 => true,
        0 => !entry.records.is_empty(),
        _ => {
            let cutoff = now - days * 86400;
            entry.records.iter().any(|r| r.time > cutoff)
        }
    }
}

/// Fetch every entity under the registrable domain of `raw`, already
/// filtered by the `days` window.
async fn entries_for(
    ctx: &Context,
    raw: &str,
    days: i64,
) -> Result<Vec<DomainEntry>, ApiError> {
    validate_days(days)?;

    if !name::is_valid(raw) {
        return Err(ApiError::InvalidDomain);
    }
    let Some(parts) = name::parts(raw) else {
        return Err(ApiError::PublicSuffix);
    };

    let now = unix_now();
    let entries = ctx.store.find_by_domain(&parts.domain, &parts.tld).await?;
    Ok(entries
        .into_iter()
        .filter(|e| entity_in_window(e, days, now))
        .collect())
}

/// Subdomain labels stored under the registrable domain of `raw`.
///
/// The apex entry has no label and is skipped; use [`lookup_full`] to see
/// it as the bare registrable domain.
///
/// # Errors
///
/// [`ApiError::InvalidDays`], [`ApiError::InvalidDomain`],
/// [`ApiError::PublicSuffix`], or [`ApiError::Internal`] on store failure.
pub async fn lookup(ctx: &Context, raw: &str, days: i64) -> Result<Vec<String>, ApiError> {
    let entries = entries_for(ctx, raw, days).await?;
    Ok(entries
        .into_iter()
        .filter(|e| !e.sub.is_empty())
        .map(|e| e.sub)
        .collect())
}

/// Fully-qualified names stored under the registrable domain of `raw`,
/// apex included.
///
/// # Errors
///
/// See [`lookup`].
pub async fn lookup_full(ctx: &Context, raw: &str, days: i64) -> Result<Vec<String>, ApiError> {
    let entries = entries_for(ctx, raw, days).await?;
    Ok(entries.into_iter().map(|e| e.fqdn()).collect())
}

/// The record history of one exact FQDN.
///
/// With `days > 0` only records observed inside the window are returned;
/// `0` and `-1` return the full history. An unknown FQDN yields an empty
/// vector.
///
/// # Errors
///
/// See [`lookup`].
pub async fn records(ctx: &Context, raw: &str, days: i64) -> Result<Vec<DnsRecord>, ApiError> {
    validate_days(days)?;

    if !name::is_valid(raw) {
        return Err(ApiError::InvalidDomain);
    }
    let cleaned = name::clean(raw);
    let Some(parts) = name::parts(&cleaned) else {
        return Err(ApiError::PublicSuffix);
    };

    let Some(entry) = ctx.store.find_one(&parts).await? else {
        return Ok(Vec::new());
    };

    let now = unix_now();
    let records = if days > 0 {
        let cutoff = now - days * 86400;
        entry
            .records
            .into_iter()
            .filter(|r| r.time > cutoff)
            .collect()
    } else {
        entry.records
    };

    Ok(records)
}

/// The TLDs observed for a second-level label, e.g. `example` →
/// `["co.uk", "com", "org"]`.
///
/// # Errors
///
/// [`ApiError::InvalidDomain`] for anything but a bare valid label, or
/// [`ApiError::Internal`] on store failure.
pub async fn tlds(ctx: &Context, sld: &str) -> Result<Vec<String>, ApiError> {
    let label = name::clean(sld);
    if label.contains('.') || !name::is_valid(&label) {
        return Err(ApiError::InvalidDomain);
    }

    Ok(ctx.store.tlds_of_domain(&label).await?)
}

/// Registrable labels starting with `prefix`, sorted. Prefix length is
/// enforced at the HTTP edge, not here.
///
/// # Errors
///
/// [`ApiError::InvalidDomain`] for a syntactically invalid prefix, or
/// [`ApiError::Internal`] on store failure.
pub async fn starts(ctx: &Context, prefix: &str) -> Result<Vec<String>, ApiError> {
    let prefix = name::clean(prefix);
    if prefix.contains('.') || !name::is_valid(&prefix) {
        return Err(ApiError::InvalidDomain);
    }

    Ok(ctx.store.domains_with_prefix(&prefix).await?)
}

/// Side effects of a successful lookup: kick the refresh pipeline and bump
/// the popularity counter. Failures are logged, never user-visible.
pub async fn note_hit(ctx: &Context, raw: &str) {
    let Some(registrable) = name::registrable_of(raw) else {
        return;
    };

    ctx.enqueue_demand(&registrable);
    if let Err(err) = ctx.store.bump_top_list(&registrable).await {
        warn!(domain = %registrable, error = %err, "failed to bump top list");
    }
}

/// Side effect of an empty lookup: remember what was searched in vain.
pub async fn note_miss(ctx: &Context, raw: &str) {
    let Some(registrable) = name::registrable_of(raw) else {
        return;
    };

    if let Err(err) = ctx.store.record_not_found(&registrable).await {
        warn!(domain = %registrable, error = %err, "failed to record not-found");
    }
}

#[cfg(test)]
#[path = "lookup_tests.rs"]
mod lookup_tests;
