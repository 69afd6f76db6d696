//! Integration tests for IP pool payloads.
//!
//! These tests check that recorded API responses decode into the typed models and
//! that the client returns them unchanged when served from a mock endpoint.

use serde_json::Value;
use sparkpost_core::config::SparkPostConfig;
use sparkpost_core::ApiResponse;
use sparkpost_ip_pools::{IpPool, IpPools};
use std::fs;
use std::path::PathBuf;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn load_fixture(name: &str) -> Value {
    let fixture_path = fixtures_dir().join(name);
    let raw = fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    });
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn test_deserialize_ip_pool_list() {
    let results = ApiResponse::Json(load_fixture("ip_pools_list.json")).into_results();
    let pools: Vec<IpPool> = serde_json::from_value(results).unwrap();

    assert_eq!(pools.len(), 2, "Expected 2 pools in test data");
    assert_eq!(pools[0].id, "marketing_ip_pool");
    assert!(pools[0].ips.is_empty());
    assert_eq!(pools[0].auto_warmup_overflow_pool.as_deref(), Some("overflow_pool"));

    let default_pool = &pools[1];
    assert_eq!(default_pool.name.as_deref(), Some("Default"));
    assert!(default_pool.signing_domain.is_none());
    assert_eq!(default_pool.ips[0].external_ip, "54.244.54.135");
    assert_eq!(default_pool.ips[0].auto_warmup_enabled, Some(true));
}

#[test]
fn test_deserialize_single_ip_pool() {
    let results = ApiResponse::Json(load_fixture("ip_pool.json")).into_results();
    let pool: IpPool = serde_json::from_value(results).unwrap();

    assert_eq!(pool.signing_domain.as_deref(), Some("example.com"));
    assert_eq!(pool.fbl_signing_domain.as_deref(), Some("sparkpostmail.com"));
    assert_eq!(pool.ips.len(), 2);
    assert_eq!(
        pool.ips[1].hostname.as_deref(),
        Some("mta474a.sparkpostmail.com")
    );
    assert_eq!(pool.ips[1].auto_warmup_enabled, Some(false));
    assert!(pool.extra.is_empty());
}

#[tokio::test]
async fn test_list_through_configured_client() {
    let server = MockServer::start().await;
    let fixture = load_fixture("ip_pools_list.json");

    Mock::given(method("GET"))
        .and(path("/api/v1/ip-pools"))
        .and(header("Authorization", "fake-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let config = SparkPostConfig::new("fake-key")
        .unwrap()
        .with_base_uri(server.uri());
    let client = IpPools::from_config(&config).unwrap();

    let pools = client.list().await.unwrap();
    assert_eq!(Value::Array(pools), fixture["results"]);
}

#[tokio::test]
async fn test_list_pools_typed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/ip-pools"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(load_fixture("ip_pools_list.json")),
        )
        .mount(&server)
        .await;

    let config = SparkPostConfig::new("fake-key")
        .unwrap()
        .with_base_uri(server.uri());
    let pools = IpPools::from_config(&config)
        .unwrap()
        .list_pools()
        .await
        .unwrap();

    let ids: Vec<&str> = pools.iter().map(|pool| pool.id.as_str()).collect();
    assert_eq!(ids, vec!["marketing_ip_pool", "default"]);
}
