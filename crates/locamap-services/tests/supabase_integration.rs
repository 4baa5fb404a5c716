//! Integration tests for the hosted database client using wiremock.

use std::sync::Arc;

use locamap_core::{StoreError, SupabaseConfig};
use locamap_maps::{LatLng, MapViewState};
use locamap_services::{Location, LocationStore, RemoteStore, RetryConfig, SupabaseClient};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> SupabaseConfig {
    SupabaseConfig {
        url: server.uri(),
        key: "anon-key".to_string(),
        table: "locations".to_string(),
    }
}

fn fast_client(server: &MockServer) -> SupabaseClient {
    SupabaseClient::new(&config_for(server))
        .unwrap()
        .with_retry_config(RetryConfig::new(2, 1, 5))
}

fn rows() -> serde_json::Value {
    serde_json::json!([
        { "id": 1, "latX": 39.47, "lonY": -0.37, "province": "V", "name": "Ayuntamiento" },
        { "id": 2, "latx": 39.98, "lony": -0.05, "province": "CS" }
    ])
}

#[tokio::test]
async fn test_select_all_sends_key_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/locations"))
        .and(query_param("select", "*"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(&mock_server);
    let locations = client.select_all().await.unwrap();

    assert_eq!(locations.len(), 2);
    assert_eq!(locations[0].position(), LatLng::new(39.47, -0.37));
    assert_eq!(locations[0].name(), Some("Ayuntamiento"));
    assert_eq!(locations[1].province.as_deref(), Some("CS"));
}

#[tokio::test]
async fn test_select_by_province_filters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/locations"))
        .and(query_param("province", "eq.V"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": 1, "latX": 39.47, "lonY": -0.37, "province": "V" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(&mock_server);
    let locations = client.select_by_province("V").await.unwrap();

    assert_eq!(locations, vec![Location::new(1, 39.47, -0.37, Some("V"))]);
}

#[tokio::test]
async fn test_delete_by_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/locations"))
        .and(query_param("id", "eq.7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(&mock_server);
    client.delete_by_id(7).await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/locations"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(&mock_server);
    let err = client.delete_by_id(7).await.unwrap_err();

    match err {
        StoreError::RemoteWrite { id, message } => {
            assert_eq!(id, 7);
            assert!(message.contains("401"));
            assert!(message.contains("Invalid API key"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/locations"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(&mock_server);
    let locations = client.select_all().await.unwrap();
    assert_eq!(locations.len(), 2);
}

#[tokio::test]
async fn test_persistent_server_error_gives_up() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/locations"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = fast_client(&mock_server);
    let err = client.select_all().await.unwrap_err();
    assert!(matches!(err, StoreError::RemoteRead(ref m) if m.contains("500")));
}

#[tokio::test]
async fn test_store_delete_then_empty_refetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": 1, "latX": 39.47, "lonY": -0.37, "province": "V" }
        ])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/locations"))
        .and(query_param("id", "eq.1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let view = MapViewState::new(LatLng::new(39.47, -0.37), 13);
    let store = LocationStore::new(Arc::new(fast_client(&mock_server)), view);

    store.refresh().await.unwrap();
    assert_eq!(store.active_index(), Some(0));

    let removed = store.remove().await.unwrap();
    assert_eq!(removed.id, 1);
    assert_eq!(store.active_index(), None);
    assert!(store.locations().is_empty());
}

#[tokio::test]
async fn test_store_delete_failure_keeps_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows()))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/locations"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let view = MapViewState::new(LatLng::new(39.47, -0.37), 13);
    let store = LocationStore::new(Arc::new(fast_client(&mock_server)), view);
    store.refresh().await.unwrap();
    store.select(1).unwrap();

    assert!(store.remove().await.is_err());
    assert_eq!(store.len(), 2);
    assert_eq!(store.active_index(), Some(1));
}
