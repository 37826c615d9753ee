//! Shared test helpers for Kanka API integration tests
//!
//! Provides wiremock-based mock server setup for Kanka API endpoints.
//! Each helper mounts the necessary mock endpoints on a server whose URI
//! acts as the campaigns API root.

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kankasync_api::{client::KankaClient, provider::KankaRemoteClient};

pub const TOKEN: &str = "test-access-token";
pub const CAMPAIGN: u64 = 42;

/// Starts a mock server and returns a remote client pointing at it.
pub async fn setup_kanka_mock() -> (MockServer, KankaRemoteClient) {
    let server = MockServer::start().await;
    let client = KankaClient::with_base_url(TOKEN, server.uri());
    (server, KankaRemoteClient::new(client))
}

/// Mounts a two-page tag listing.
///
/// The first page links to `?page=2` with an absolute URL; the second page
/// has a null `next` link. Each page is served exactly once.
pub async fn mount_tags_paginated(server: &MockServer, page1: Value, page2: Value) {
    let tags_path = format!("/{CAMPAIGN}/tags");

    Mock::given(method("GET"))
        .and(path(tags_path.as_str()))
        .and(query_param("page", "2"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": page2,
            "links": {"next": null}
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(tags_path.as_str()))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": page1,
            "links": {"next": format!("{}{}?page=2", server.uri(), tags_path)}
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts a create endpoint answering with the given status and `data` record.
pub async fn mount_create(server: &MockServer, collection: &str, status: u16, data: Value) {
    Mock::given(method("POST"))
        .and(path(format!("/{CAMPAIGN}/{collection}").as_str()))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "data": data })))
        .mount(server)
        .await;
}

/// Mounts an update endpoint answering with the given status and `data` record.
pub async fn mount_update(
    server: &MockServer,
    collection: &str,
    id: u64,
    status: u16,
    data: Value,
) {
    Mock::given(method("PATCH"))
        .and(path(format!("/{CAMPAIGN}/{collection}/{id}").as_str()))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "data": data })))
        .mount(server)
        .await;
}
