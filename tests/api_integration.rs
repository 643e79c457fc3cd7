// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end tests for the Columbus HTTP service.
//!
//! Each test boots the full stack - store, refresh pipeline, HTTP server -
//! on an ephemeral port, with DNS answered by a scripted querier so no
//! network access is needed.
//!
//! Run with: cargo test --test api_integration

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum_server::Handle;
use columbus::config::Config;
use columbus::context::Context;
use columbus::db::Store;
use columbus::dns::resolver::{Querier, QueryError, RrType};
use columbus::{refresh, server};

// ============================================================================
// Helpers
// ============================================================================

/// A querier answering from a fixed table; everything else is NXDOMAIN.
#[derive(Default)]
struct TableQuerier {
    answers: Mutex<HashMap<(String, u16), Vec<String>>>,
}

impl TableQuerier {
    fn answer(&self, fqdn: &str, rtype: RrType, values: &[&str]) {
        self.answers.lock().unwrap().insert(
            (fqdn.to_string(), rtype.code()),
            values.iter().map(ToString::to_string).collect(),
        );
    }
}

#[async_trait]
impl Querier for TableQuerier {
    async fn query(&self, rtype: RrType, fqdn: &str) -> Result<Vec<String>, QueryError> {
        match self
            .answers
            .lock()
            .unwrap()
            .get(&(fqdn.to_string(), rtype.code()))
        {
            Some(values) => Ok(values.clone()),
            None => Err(QueryError::NameError),
        }
    }
}

struct TestService {
    ctx: Arc<Context>,
    querier: Arc<TableQuerier>,
    base: String,
    handle: Handle,
}

/// Boot the full service on an ephemeral port.
async fn start_service(extra_yaml: &str) -> TestService {
    let raw = format!(
        "DatabaseURI: \"sqlite::memory:\"\nAddress: \"127.0.0.1:0\"\n{extra_yaml}"
    );
    let config = Config::parse(&raw).expect("test config must parse");
    let store = Store::connect(&config.database_uri)
        .await
        .expect("in-memory store must connect");

    let querier = Arc::new(TableQuerier::default());
    let ctx = Context::new(config, store, querier.clone());

    refresh::scheduler::spawn(&ctx);

    let handle = Handle::new();
    let server_ctx = ctx.clone();
    let server_handle = handle.clone();
    tokio::spawn(async move {
        server::run(server_ctx, server_handle)
            .await
            .expect("server must start");
    });

    let addr = handle
        .listening()
        .await
        .expect("server must bind an address");

    TestService {
        ctx,
        querier,
        base: format!("http://{addr}"),
        handle,
    }
}

fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Poll until the closure returns true or the deadline passes.
async fn wait_for<F, Fut>(what: &str, mut probe: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !probe().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_insert_refresh_lookup_flow() {
    let service = start_service("").await;
    service.ctx.store.create_user("k-test", "tester", false).await.unwrap();
    service
        .querier
        .answer("www.example.com", RrType::A, &["192.0.2.1"]);
    service
        .querier
        .answer("www.example.com", RrType::Txt, &["hello"]);

    let client = reqwest::Client::new();

    // Insert through the authenticated endpoint.
    let response = client
        .put(format!("{}/api/insert/www.example.com", service.base))
        .header("X-Api-Key", "k-test")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // The background refresh picks the name up from the demand channel.
    let base = service.base.clone();
    let lookup_client = client.clone();
    wait_for("first refresh to land", move || {
        let client = lookup_client.clone();
        let url = format!("{base}/api/lookup/example.com?days=0");
        async move {
            client
                .get(url)
                .send()
                .await
                .is_ok_and(|r| r.status() == 200)
        }
    })
    .await;

    let subs: Vec<String> = client
        .get(format!("{}/api/lookup/example.com", service.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(subs, ["www"]);

    // History carries both observed records for the exact FQDN.
    let records: Vec<serde_json::Value> = client
        .get(format!("{}/api/history/www.example.com", service.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().any(|r| r["value"] == "192.0.2.1"));
    assert!(records.iter().any(|r| r["value"] == "hello"));
}

#[tokio::test]
async fn test_lookup_error_statuses() {
    let service = start_service("").await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/lookup/unknown.test", service.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "not found");

    let response = client
        .get(format!("{}/api/lookup/co.uk", service.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .get(format!("{}/api/lookup/example.com?days=-5", service.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid days");
}

#[tokio::test]
async fn test_plain_text_negotiation() {
    let service = start_service("").await;
    service
        .ctx
        .store
        .upsert_domain(&columbus::dns::name::parts("www.example.com").unwrap())
        .await
        .unwrap();

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/api/lookup/example.com", service.base))
        .header("Accept", "text/plain")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "www");
}

#[tokio::test]
async fn test_blacklist_cycle_over_http() {
    let service = start_service("BlacklistSec: 1\n").await;
    service.ctx.store.create_user("k-test", "tester", false).await.unwrap();
    let client = reqwest::Client::new();
    let url = format!("{}/api/user", service.base);

    // Unknown key: 401, and the client IP lands on the blacklist.
    let response = client
        .get(&url)
        .header("X-Api-Key", "bogus")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Even a valid key is refused while blocked.
    let response = client
        .get(&url)
        .header("X-Api-Key", "k-test")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "blocked");

    // The block expires.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let response = client
        .get(&url)
        .header("X-Api-Key", "k-test")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_legacy_redirects() {
    let service = start_service("").await;
    let client = no_redirect_client();

    // Browsers go to the HTML search, temporarily.
    let response = client
        .get(format!("{}/lookup/example.com", service.base))
        .header("Accept", "text/html")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 307);
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        "/search/example.com"
    );

    // API clients go to /api permanently, keeping the days parameter.
    let response = client
        .get(format!("{}/lookup/example.com?days=3", service.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 308);
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        "/api/lookup/example.com?days=3"
    );

    let response = client
        .get(format!("{}/tools/tld/example.co.uk", service.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 308);
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        "/api/tools/tld/example.co.uk"
    );
}

#[tokio::test]
async fn test_tools_over_http() {
    let service = start_service("").await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .get(format!("{}/api/tools/domain/mail.example.co.uk", service.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["result"], "example.co.uk");

    let body: serde_json::Value = client
        .get(format!("{}/api/tools/isvalid/exa..mple.com", service.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["result"], false);
}

#[tokio::test]
async fn test_html_pages_and_metrics() {
    let service = start_service("").await;
    service
        .ctx
        .store
        .upsert_domain(&columbus::dns::name::parts("www.example.com").unwrap())
        .await
        .unwrap();

    let client = reqwest::Client::new();

    let response = client.get(format!("{}/", service.base)).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("<form"));

    let response = client
        .get(format!("{}/search/example.com", service.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("www.example.com"));

    let response = client
        .get(format!("{}/stat", service.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/metrics", service.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("columbus_"));
}

#[tokio::test]
async fn test_api_stat_endpoint() {
    let service = start_service("").await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/stat", service.base);

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), 204);

    columbus::stats::snapshot_and_insert(&service.ctx).await.unwrap();

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["total"], 0);
    assert!(body["date"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let service = start_service("").await;
    let client = reqwest::Client::new();

    // The server is alive…
    let response = client
        .get(format!("{}/", service.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // …and drains away on demand.
    service
        .handle
        .graceful_shutdown(Some(Duration::from_secs(1)));
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(client
        .get(format!("{}/", service.base))
        .send()
        .await
        .is_err());
}
