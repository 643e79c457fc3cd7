// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The records refresh pipeline.
//!
//! - [`reconciler`] - re-resolve one FQDN and fold the answers into its
//!   stored record history
//! - [`scheduler`] - the worker pool draining the `demand` and `internal`
//!   channels, plus the two samplers feeding `internal`
//!
//! This module also hosts the insertion path: validated first-time inserts
//! enqueue themselves to `demand` so a fresh name resolves promptly instead
//! of waiting to be sampled.

pub mod reconciler;
pub mod scheduler;

use crate::context::Context;
use crate::dns::name;
use crate::errors::ApiError;

/// Insert a harvested FQDN into the inventory.
///
/// Validates and canonicalizes the name, splits it into `(domain, tld,
/// sub)` and upserts the triple. Returns `true` when the name is new, in
/// which case it is also handed to the refresh pipeline (best-effort, the
/// caller never waits on DNS).
///
/// # Errors
///
/// [`ApiError::InvalidDomain`] when validation fails,
/// [`ApiError::PublicSuffix`] when the name has no registrable part, and
/// [`ApiError::Internal`] on store failure.
pub async fn insert_fqdn(ctx: &Context, raw: &str) -> Result<bool, ApiError> {
    if !name::is_valid(raw) {
        return Err(ApiError::InvalidDomain);
    }

    let cleaned = name::clean(raw);
    let Some(parts) = name::parts(&cleaned) else {
        return Err(ApiError::PublicSuffix);
    };

    let inserted = ctx.store.upsert_domain(&parts).await?;
    if inserted {
        ctx.enqueue_demand(&parts.fqdn());
    }
    Ok(inserted)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
