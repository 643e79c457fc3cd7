// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the HTML pages.

#[cfg(test)]
mod tests {
    use axum::extract::{Path, State};
    use axum::response::Response;

    use super::super::*;
    use crate::context::testing::scripted_context;
    use crate::db::{ScannerProgress, StatEntry};
    use crate::dns::name::parts;

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
        assert_eq!(format_thousands(-1000), "-1,000");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_time(1_700_000_000), "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn test_stat_view_percentages_and_order() {
        let entry = StatEntry {
            date: 1_700_000_000,
            total: 200,
            updated: 50,
            valid: 100,
            scanners: vec![
                ScannerProgress {
                    name: "slow".to_string(),
                    index: 1,
                    size: 100,
                },
                ScannerProgress {
                    name: "fast".to_string(),
                    index: 99,
                    size: 100,
                },
            ],
        };

        let view = stat_view(&entry);
        assert_eq!(view["updated_percent"], "25.00%");
        assert_eq!(view["valid_percent"], "50.00%");
        assert_eq!(view["ct_total"], "200");
        // Scanners are sorted by completion, descending.
        assert_eq!(view["scanners"][0]["name"], "fast");
        assert_eq!(view["scanners"][1]["name"], "slow");
    }

    #[test]
    fn test_stat_view_with_zero_total() {
        let entry = StatEntry {
            date: 0,
            total: 0,
            updated: 0,
            valid: 0,
            scanners: vec![],
        };
        let view = stat_view(&entry);
        assert_eq!(view["updated_percent"], "0.00%");
    }

    #[tokio::test]
    async fn test_search_index_serves_form() {
        let html = search_index().await;
        assert!(html.0.contains("<form"));
    }

    #[tokio::test]
    async fn test_search_result_renders_records_and_unknowns() {
        let (ctx, _querier) = scripted_context("").await;
        for fqdn in ["example.com", "www.example.com"] {
            ctx.store.upsert_domain(&parts(fqdn).unwrap()).await.unwrap();
        }
        let www = parts("www.example.com").unwrap();
        ctx.store.append_record(&www, 1, "192.0.2.1", 1_700_000_000).await.unwrap();

        let response =
            search_result(State(ctx.clone()), Path("example.com".to_string())).await;
        assert_eq!(response.status(), 200);

        let body = body_string(response).await;
        assert!(body.contains("www.example.com"));
        assert!(body.contains("192.0.2.1"));
        assert!(body.contains(">A<"));
        // The record-less apex lands in the unresolved list.
        assert!(body.contains("Without records"));

        // The page counts as one hit.
        assert_eq!(ctx.store.top_list_count("example.com").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_result_error_pages() {
        let (ctx, _querier) = scripted_context("").await;

        let response =
            search_result(State(ctx.clone()), Path("not a domain".to_string())).await;
        assert_eq!(response.status(), 400);

        let response =
            search_result(State(ctx.clone()), Path("missing.test".to_string())).await;
        assert_eq!(response.status(), 404);
        assert!(ctx.store.is_not_found("missing.test").await.unwrap());
    }

    #[tokio::test]
    async fn test_stat_page_renders() {
        let (ctx, _querier) = scripted_context("").await;

        // Without a snapshot the page renders the empty state.
        let response = stat_page(State(ctx.clone())).await;
        assert_eq!(response.status(), 200);
        assert!(body_string(response).await.contains("No statistics"));

        ctx.store
            .insert_stat(&StatEntry {
                date: 1_700_000_000,
                total: 1000,
                updated: 500,
                valid: 250,
                scanners: vec![ScannerProgress {
                    name: "xenon2024".to_string(),
                    index: 10,
                    size: 100,
                }],
            })
            .await
            .unwrap();

        let response = stat_page(State(ctx)).await;
        assert_eq!(response.status(), 200);
        let body = body_string(response).await;
        assert!(body.contains("1,000"));
        assert!(body.contains("50.00%"));
        assert!(body.contains("xenon2024"));
    }
}
