// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the insertion path.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::context::testing::scripted_context;
    use crate::dns::name::parts;
    use crate::errors::ApiError;

    #[tokio::test]
    async fn test_first_insert_stores_and_enqueues() {
        let (ctx, _querier) = scripted_context("").await;

        assert!(insert_fqdn(&ctx, "www.example.com").await.unwrap());

        // The triple landed in the store…
        let entry = ctx
            .store
            .find_one(&parts("www.example.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.updated, 0);
        assert!(entry.records.is_empty());

        // …and the demand channel carries the new name.
        assert_eq!(ctx.demand_rx.recv().await.unwrap(), "www.example.com");
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_quiet() {
        let (ctx, _querier) = scripted_context("").await;

        assert!(insert_fqdn(&ctx, "www.example.com").await.unwrap());
        assert_eq!(ctx.demand_rx.recv().await.unwrap(), "www.example.com");

        // Second insert: not new, nothing enqueued.
        assert!(!insert_fqdn(&ctx, "www.example.com").await.unwrap());
        assert!(ctx.demand_rx.is_empty());
        assert_eq!(ctx.store.count_total().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_canonicalizes() {
        let (ctx, _querier) = scripted_context("").await;

        assert!(insert_fqdn(&ctx, "WWW.Example.COM.").await.unwrap());
        assert!(!insert_fqdn(&ctx, "www.example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_name_is_rejected() {
        let (ctx, _querier) = scripted_context("").await;

        let err = insert_fqdn(&ctx, "not a domain").await.unwrap_err();
        assert_eq!(err, ApiError::InvalidDomain);
        assert_eq!(ctx.store.count_total().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_public_suffix_is_rejected() {
        let (ctx, _querier) = scripted_context("").await;

        // `co.uk` is a public suffix: syntactically fine, but there is no
        // registrable domain to store it under.
        let err = insert_fqdn(&ctx, "co.uk").await.unwrap_err();
        assert_eq!(err, ApiError::PublicSuffix);
        assert_eq!(ctx.store.count_total().await.unwrap(), 0);
        assert!(ctx.demand_rx.is_empty());
    }
}
