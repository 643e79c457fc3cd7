// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The record reconciler: one refresh run for one FQDN.
//!
//! A refresh walks the fixed record-type set in order and folds every
//! canonical answer into the stored history with a two-phase
//! touch-or-append: an existing `(type, value)` row gets its observation
//! time bumped, a new pair is appended. Records are never removed; `time`
//! is the freshness signal and read paths filter on it.
//!
//! Two guards bound the work:
//!
//! - the cool-down gate suppresses a second refresh of the same FQDN within
//!   one hour, and stamps `updated` *before* any DNS work so concurrent
//!   refreshers back off early
//! - the per-FQDN lock table serializes refreshes of one name inside the
//!   process, so a touch observing more than one matching row means the
//!   store itself is corrupted and the run aborts

use tracing::debug;

use crate::constants::REFRESH_COOLDOWN_SECS;
use crate::context::{unix_now, Context};
use crate::dns::name;
use crate::dns::resolver::RrType;
use crate::errors::{RefreshError, StoreError};
use crate::metrics;

/// Re-resolve every record type for `fqdn` and reconcile the answers into
/// the store.
///
/// With `ignore_err` the four routine DNS failures (NXDOMAIN, SERVFAIL,
/// refused, timeout) skip the affected type and the run continues; any
/// other failure aborts. With `ignore_cooldown` the one-hour gate is
/// bypassed (used by first-time resolution and tests).
///
/// Refreshing a name that is not stored is a successful no-op: the refresh
/// pipeline never creates entities.
///
/// # Errors
///
/// Returns a [`RefreshError`] for invalid names, store failures, broken
/// record invariants and non-routine DNS failures.
pub async fn refresh_fqdn(
    ctx: &Context,
    fqdn: &str,
    ignore_err: bool,
    ignore_cooldown: bool,
) -> Result<(), RefreshError> {
    let cleaned = name::clean(fqdn);
    if !name::is_valid(&cleaned) {
        return Err(RefreshError::InvalidDomain(cleaned));
    }
    let Some(parts) = name::parts(&cleaned) else {
        return Err(RefreshError::PublicSuffix(cleaned));
    };

    let _guard = ctx.refresh_locks.lock(&cleaned).await;

    let now = unix_now();
    let Some(updated) = ctx.store.get_updated(&parts).await? else {
        debug!(fqdn = %cleaned, "not stored, nothing to refresh");
        return Ok(());
    };

    if !ignore_cooldown && now - updated < REFRESH_COOLDOWN_SECS {
        metrics::record_refresh("cooldown");
        return Ok(());
    }

    // Stamp first: a concurrent refresher reads the fresh stamp and backs
    // off, so the same FQDN is resolved at most roughly once per hour.
    ctx.store.set_updated(&parts, now).await?;

    for rtype in RrType::ALL {
        if ctx
            .wildcards
            .is_wildcard(ctx.querier.as_ref(), &cleaned, rtype)
            .await
        {
            debug!(
                fqdn = %cleaned,
                rtype = rtype.mnemonic(),
                "parent zone is wildcarded, skipping type"
            );
            continue;
        }

        let values = match ctx.querier.query(rtype, &cleaned).await {
            Ok(values) => values,
            Err(err) if ignore_err && err.is_routine() => {
                debug!(
                    fqdn = %cleaned,
                    rtype = rtype.mnemonic(),
                    error = %err,
                    "routine DNS failure, skipping type"
                );
                continue;
            }
            Err(err) => {
                metrics::record_refresh("error");
                return Err(RefreshError::Dns {
                    rtype: rtype.mnemonic(),
                    source: err,
                });
            }
        };

        for value in values {
            let matched = ctx
                .store
                .touch_record(&parts, rtype.code(), &value, now)
                .await?;
            match matched {
                0 => {
                    ctx.store
                        .append_record(&parts, rtype.code(), &value, now)
                        .await?;
                }
                1 => {}
                matched => {
                    metrics::record_refresh("error");
                    return Err(StoreError::DuplicateRecord {
                        fqdn: cleaned,
                        rtype: rtype.code(),
                        value,
                        matched,
                    }
                    .into());
                }
            }
        }
    }

    metrics::record_refresh("success");
    Ok(())
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod reconciler_tests;
