// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The refresh scheduler: worker pool and samplers.
//!
//! Workers select over the `demand` and `internal` channels with equal
//! priority. A token with a subdomain refreshes that single FQDN; a bare
//! registrable domain expands to every stored FQDN under it, which is why a
//! single lookup of `example.com` cascades into refreshing all of its known
//! subdomains.
//!
//! Two samplers feed `internal`:
//!
//! - the random sampler pulls 1000 uniformly sampled entries per iteration
//!   and enqueues the never-refreshed ones (`updated == 0`)
//! - the top-list sampler sleeps a random number of hours, then walks the
//!   popularity counters in descending order and enqueues every stored FQDN
//!   under each popular domain
//!
//! Sampler sends block, throttling both to the pool's drain rate.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use rand::RngExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::constants::{
    PROGRESS_LOG_INTERVAL_SECS, SAMPLER_BACKOFF_SECS, SAMPLER_IDLE_SECS, SAMPLE_SIZE,
    TOP_LIST_SLEEP_MAX_HOURS,
};
use crate::context::Context;
use crate::dns::name;
use crate::metrics;

use super::reconciler::refresh_fqdn;

/// Spawn the worker pool, both samplers and the progress logger.
///
/// The tasks run for the lifetime of the process; the returned handles are
/// only used to keep them owned somewhere.
pub fn spawn(ctx: &Arc<Context>) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(ctx.config.dns_worker + 3);

    for worker_id in 0..ctx.config.dns_worker {
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            worker_loop(&ctx, worker_id).await;
        }));
    }

    let sampler_ctx = ctx.clone();
    handles.push(tokio::spawn(async move {
        random_sampler(&sampler_ctx).await;
    }));

    let top_ctx = ctx.clone();
    handles.push(tokio::spawn(async move {
        top_list_sampler(&top_ctx).await;
    }));

    let progress_ctx = ctx.clone();
    handles.push(tokio::spawn(async move {
        progress_logger(&progress_ctx).await;
    }));

    handles
}

async fn worker_loop(ctx: &Context, worker_id: usize) {
    info!(worker_id, "refresh worker started");

    loop {
        let token = tokio::select! {
            token = ctx.demand_rx.recv() => token,
            token = ctx.internal_rx.recv() => token,
        };
        let Ok(token) = token else {
            break;
        };
        dispatch(ctx, &token).await;
    }

    info!(worker_id, "refresh worker stopped");
}

/// Handle one dequeued token: a single FQDN, or a registrable domain to
/// expand.
pub(crate) async fn dispatch(ctx: &Context, token: &str) {
    let Some(parts) = name::parts(token) else {
        debug!(token, "dropping unparseable refresh token");
        return;
    };

    if !parts.sub.is_empty() {
        refresh_one(ctx, &parts.fqdn()).await;
        return;
    }

    match ctx.store.list_fqdns(&parts.domain, &parts.tld).await {
        Ok(fqdns) => {
            for fqdn in fqdns {
                refresh_one(ctx, &fqdn).await;
            }
        }
        Err(err) => {
            warn!(token, error = %err, "failed to expand registrable domain");
        }
    }
}

async fn refresh_one(ctx: &Context, fqdn: &str) {
    ctx.dispatched.fetch_add(1, Ordering::Relaxed);
    metrics::record_dispatch();

    if let Err(err) = refresh_fqdn(ctx, fqdn, true, false).await {
        warn!(fqdn, error = %err, "refresh failed");
    }
}

/// Enqueue never-refreshed entries from uniform samples, forever.
async fn random_sampler(ctx: &Context) {
    info!("random sampler started");

    loop {
        let entries = match ctx.store.sample_domains(SAMPLE_SIZE).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "random sampler failed to sample, backing off");
                sleep(Duration::from_secs(SAMPLER_BACKOFF_SECS)).await;
                continue;
            }
        };

        let mut enqueued = 0_usize;
        for entry in entries.iter().filter(|e| e.updated == 0) {
            if ctx.internal_tx.send(entry.fqdn()).await.is_err() {
                return;
            }
            enqueued += 1;
        }

        if enqueued == 0 {
            // Nothing new in this sample; no point hammering the store.
            sleep(Duration::from_secs(SAMPLER_IDLE_SECS)).await;
        } else {
            debug!(enqueued, "random sampler enqueued fresh entries");
        }
    }
}

/// Periodically walk the popularity counters and enqueue every stored FQDN
/// under each popular domain, most popular first.
async fn top_list_sampler(ctx: &Context) {
    info!("top-list sampler started");

    loop {
        let hours = rand::rng().random_range(0..TOP_LIST_SLEEP_MAX_HOURS);
        sleep(Duration::from_secs(hours * 3600)).await;

        let top = match ctx.store.top_domains().await {
            Ok(top) => top,
            Err(err) => {
                warn!(error = %err, "top-list sampler failed to read counters");
                continue;
            }
        };

        for (registrable, count) in top {
            let Some(parts) = name::parts(&registrable) else {
                continue;
            };
            match ctx.store.list_fqdns(&parts.domain, &parts.tld).await {
                Ok(fqdns) => {
                    debug!(domain = %registrable, count, fqdns = fqdns.len(), "enqueueing popular domain");
                    for fqdn in fqdns {
                        if ctx.internal_tx.send(fqdn).await.is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    warn!(domain = %registrable, error = %err, "failed to expand popular domain");
                }
            }
        }
    }
}

/// Log the monotonic dispatch counter once a minute.
async fn progress_logger(ctx: &Context) {
    loop {
        sleep(Duration::from_secs(PROGRESS_LOG_INTERVAL_SECS)).await;
        info!(
            dispatched = ctx.dispatched.load(Ordering::Relaxed),
            "refresh pipeline progress"
        );
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod scheduler_tests;
