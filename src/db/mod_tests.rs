// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the store handle and the small collections.

#[cfg(test)]
mod tests {
    use super::super::*;

    async fn memory_store() -> Store {
        Store::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_connect_initializes_schema() {
        let store = memory_store().await;
        assert_eq!(store.count_total().await.unwrap(), 0);
        assert_eq!(store.stat_count().await.unwrap(), 0);
        assert!(store.scanner_progress().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_to_file_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let uri = format!("sqlite://{}/columbus.db", dir.path().display());

        let store = Store::connect(&uri).await.unwrap();
        assert_eq!(store.count_total().await.unwrap(), 0);

        // Re-connecting over the existing file must not fail: the schema is
        // created with IF NOT EXISTS.
        drop(store);
        let store = Store::connect(&uri).await.unwrap();
        assert_eq!(store.count_total().await.unwrap(), 0);
    }

    #[test]
    fn test_record_wire_form() {
        let record = DnsRecord {
            rtype: 1,
            value: "192.0.2.1".to_string(),
            time: 1700000000,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"type":1,"value":"192.0.2.1","time":1700000000}"#);
    }

    #[test]
    fn test_entry_wire_form_omits_empty_records() {
        let entry = DomainEntry {
            domain: "example".to_string(),
            tld: "com".to_string(),
            sub: "www".to_string(),
            updated: 0,
            records: Vec::new(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("records"));
        assert_eq!(entry.fqdn(), "www.example.com");
    }

    #[tokio::test]
    async fn test_top_list_counts() {
        let store = memory_store().await;

        store.bump_top_list("example.com").await.unwrap();
        store.bump_top_list("example.com").await.unwrap();
        store.bump_top_list("example.org").await.unwrap();

        assert_eq!(store.top_list_count("example.com").await.unwrap(), 2);
        assert_eq!(store.top_list_count("example.org").await.unwrap(), 1);
        assert_eq!(store.top_list_count("absent.test").await.unwrap(), 0);

        let top = store.top_domains().await.unwrap();
        assert_eq!(
            top,
            vec![
                ("example.com".to_string(), 2),
                ("example.org".to_string(), 1)
            ]
        );
    }

    #[tokio::test]
    async fn test_not_found_set_is_idempotent() {
        let store = memory_store().await;

        assert!(!store.is_not_found("example.com").await.unwrap());
        store.record_not_found("example.com").await.unwrap();
        store.record_not_found("example.com").await.unwrap();
        assert!(store.is_not_found("example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_scanner_progress_round_trip() {
        let store = memory_store().await;

        store.set_scanner_progress("Xenon2024", 100, 1000).await.unwrap();
        store.set_scanner_progress("argon2025", 5, 50).await.unwrap();
        store.set_scanner_progress("xenon2024", 200, 1000).await.unwrap();

        let scanners = store.scanner_progress().await.unwrap();
        assert_eq!(scanners.len(), 2);
        assert_eq!(scanners[0].name, "argon2025");
        assert_eq!(scanners[1].name, "xenon2024");
        assert_eq!(scanners[1].index, 200);
        assert_eq!(scanners[1].size, 1000);
    }

    #[tokio::test]
    async fn test_stats_append_newest_and_trim() {
        let store = memory_store().await;

        for i in 0..5 {
            store
                .insert_stat(&StatEntry {
                    date: 1_700_000_000 + i,
                    total: 10 + i,
                    updated: i,
                    valid: i,
                    scanners: vec![ScannerProgress {
                        name: "xenon2024".to_string(),
                        index: i,
                        size: 100,
                    }],
                })
                .await
                .unwrap();
        }

        let newest = store.newest_stat().await.unwrap().unwrap();
        assert_eq!(newest.date, 1_700_000_004);
        assert_eq!(newest.total, 14);
        assert_eq!(newest.scanners[0].index, 4);

        let deleted = store.trim_stats(3).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.stat_count().await.unwrap(), 3);

        // The newest entries survive the trim.
        let newest = store.newest_stat().await.unwrap().unwrap();
        assert_eq!(newest.date, 1_700_000_004);

        // Trimming below the cap is a no-op.
        assert_eq!(store.trim_stats(3).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_newest_stat_on_empty_table() {
        let store = memory_store().await;
        assert!(store.newest_stat().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_key_lookup() {
        let store = memory_store().await;

        store.create_user("k-123", "scanner", false).await.unwrap();
        store.create_user("k-456", "admin", true).await.unwrap();

        let user = store.user_by_key("k-123").await.unwrap().unwrap();
        assert_eq!(user.name, "scanner");
        assert!(!user.admin);

        let user = store.user_by_key("k-456").await.unwrap().unwrap();
        assert!(user.admin);

        assert!(store.user_by_key("bogus").await.unwrap().is_none());
        assert!(store.user_by_key("").await.unwrap().is_none());

        // Duplicate keys and names violate the schema.
        assert!(store.create_user("k-123", "other", false).await.is_err());
        assert!(store.create_user("k-789", "scanner", false).await.is_err());
    }
}
