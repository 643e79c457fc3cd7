// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The statistics snapshotter.
//!
//! Two background tasks:
//!
//! - the snapshot worker counts the population (total, updated, valid),
//!   reads the scanner cursors and appends one stat entry - once at startup
//!   and then every two to four hours at a random offset
//! - the retention worker trims the stats collection back to the newest 100
//!   entries once an hour, after an initial random sleep so the two tasks
//!   do not sync up
//!
//! Counting the whole population is slow on a large store; the random
//! offsets keep snapshots from clustering around process restarts.

use std::sync::Arc;
use std::time::Duration;

use rand::RngExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::constants::{
    MAX_STATS_ENTRIES, STATS_CLEAN_INTERVAL_SECS, STATS_SLEEP_MAX_SECS, STATS_SLEEP_MIN_SECS,
};
use crate::context::{unix_now, Context};
use crate::db::StatEntry;
use crate::errors::StoreError;

/// Count the population and assemble one snapshot.
///
/// # Errors
///
/// Returns a [`StoreError`] on database failure.
pub async fn snapshot(ctx: &Context) -> Result<StatEntry, StoreError> {
    Ok(StatEntry {
        date: unix_now(),
        total: ctx.store.count_total().await?,
        updated: ctx.store.count_updated().await?,
        valid: ctx.store.count_valid().await?,
        scanners: ctx.store.scanner_progress().await?,
    })
}

/// Take one snapshot and append it to the stats collection.
///
/// # Errors
///
/// Returns a [`StoreError`] on database failure.
pub async fn snapshot_and_insert(ctx: &Context) -> Result<(), StoreError> {
    let entry = snapshot(ctx).await?;
    ctx.store.insert_stat(&entry).await?;
    debug!(
        total = entry.total,
        updated = entry.updated,
        valid = entry.valid,
        "inserted stat entry"
    );
    Ok(())
}

/// Spawn the snapshot and retention workers.
pub fn spawn(ctx: &Arc<Context>) -> Vec<JoinHandle<()>> {
    let insert_ctx = ctx.clone();
    let clean_ctx = ctx.clone();

    vec![
        tokio::spawn(async move {
            insert_worker(&insert_ctx).await;
        }),
        tokio::spawn(async move {
            clean_worker(&clean_ctx).await;
        }),
    ]
}

async fn insert_worker(ctx: &Context) {
    info!("stats snapshot worker started");

    if let Err(err) = snapshot_and_insert(ctx).await {
        error!(error = %err, "failed to insert stat entry");
    }

    loop {
        let secs = rand::rng().random_range(STATS_SLEEP_MIN_SECS..STATS_SLEEP_MAX_SECS);
        sleep(Duration::from_secs(secs)).await;

        if let Err(err) = snapshot_and_insert(ctx).await {
            error!(error = %err, "failed to insert stat entry");
        }
    }
}

async fn clean_worker(ctx: &Context) {
    let offset = rand::rng().random_range(0..STATS_SLEEP_MIN_SECS);
    sleep(Duration::from_secs(offset)).await;

    info!("stats retention worker started");

    loop {
        match ctx.store.stat_count().await {
            Ok(count) if count > MAX_STATS_ENTRIES => {
                match ctx.store.trim_stats(MAX_STATS_ENTRIES).await {
                    Ok(deleted) => debug!(deleted, "trimmed stats collection"),
                    Err(err) => error!(error = %err, "failed to trim stats collection"),
                }
            }
            Ok(_) => {}
            Err(err) => error!(error = %err, "failed to count stat entries"),
        }

        sleep(Duration::from_secs(STATS_CLEAN_INTERVAL_SECS)).await;
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod stats_tests;
