// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for scheduler.rs

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use crate::refresh::scheduler;
    use crate::context::testing::scripted_context;
    use crate::dns::name::parts;
    use crate::dns::resolver::RrType;

    #[tokio::test]
    async fn test_dispatch_refreshes_single_fqdn() {
        let (ctx, querier) = scripted_context("").await;
        ctx.store
            .upsert_domain(&parts("www.example.com").unwrap())
            .await
            .unwrap();
        querier.answer("www.example.com", RrType::A, &["192.0.2.1"]);

        scheduler::dispatch(&ctx, "www.example.com").await;

        let entry = ctx
            .store
            .find_one(&parts("www.example.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(entry.updated > 0);
        assert_eq!(entry.records.len(), 1);
        assert_eq!(ctx.dispatched.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_dispatch_expands_registrable_domain() {
        let (ctx, _querier) = scripted_context("").await;
        for fqdn in ["acme.test", "a.acme.test", "b.acme.test"] {
            ctx.store.upsert_domain(&parts(fqdn).unwrap()).await.unwrap();
        }
        // An unrelated domain must not be touched.
        ctx.store
            .upsert_domain(&parts("other.test").unwrap())
            .await
            .unwrap();

        scheduler::dispatch(&ctx, "acme.test").await;

        assert_eq!(ctx.dispatched.load(Ordering::Relaxed), 3);
        for fqdn in ["acme.test", "a.acme.test", "b.acme.test"] {
            let entry = ctx.store.find_one(&parts(fqdn).unwrap()).await.unwrap().unwrap();
            assert!(entry.updated > 0, "{fqdn} was not refreshed");
        }
        let other = ctx
            .store
            .find_one(&parts("other.test").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(other.updated, 0);
    }

    #[tokio::test]
    async fn test_dispatch_ignores_garbage_tokens() {
        let (ctx, _querier) = scripted_context("").await;

        scheduler::dispatch(&ctx, "co.uk").await;
        scheduler::dispatch(&ctx, "not a token").await;

        assert_eq!(ctx.dispatched.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_workers_drain_both_channels() {
        let (ctx, _querier) = scripted_context("DNSWorker: 2\n").await;
        for fqdn in ["a.acme.test", "b.acme.test"] {
            ctx.store.upsert_domain(&parts(fqdn).unwrap()).await.unwrap();
        }

        let handles = scheduler::spawn(&ctx);

        // One token per channel; both must be processed.
        assert!(ctx.enqueue_demand("a.acme.test"));
        ctx.internal_tx.send("b.acme.test".to_string()).await.unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let a = ctx
                .store
                .find_one(&parts("a.acme.test").unwrap())
                .await
                .unwrap()
                .unwrap();
            let b = ctx
                .store
                .find_one(&parts("b.acme.test").unwrap())
                .await
                .unwrap()
                .unwrap();
            if a.updated > 0 && b.updated > 0 {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "workers did not drain the channels in time"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        for handle in handles {
            handle.abort();
        }
    }
}
