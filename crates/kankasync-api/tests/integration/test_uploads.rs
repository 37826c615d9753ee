//! Integration tests for entity, post and tag create/update calls

use kankasync_core::domain::{AccountId, EntityType, RemoteId};
use kankasync_core::ports::{IRemoteClient, Resource};
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use kankasync_api::{client::KankaClient, provider::KankaRemoteClient};

use crate::common::{self, CAMPAIGN};

fn account() -> AccountId {
    AccountId::new(CAMPAIGN)
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_entity_posts_body() {
    let server = MockServer::start().await;
    let body = json!({
        "name": "Bob",
        "entry": "<p>hi</p>\n",
        "tags": [1]
    });
    Mock::given(method("POST"))
        .and(path(format!("/{CAMPAIGN}/characters")))
        .and(header("authorization", "Bearer secret"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"id": 12, "entity_id": 120, "name": "Bob", "created_at": "2024-01-01T00:00:00.000000Z"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let remote = KankaRemoteClient::new(KankaClient::with_base_url("secret", server.uri()));
    let response = remote
        .create(account(), &Resource::Entity(EntityType::Character), &body)
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert!(response.is_success());
    assert_eq!(response.id(), Some(RemoteId::new(12).unwrap()));
    let data = response.body.unwrap();
    assert_eq!(data.entity_id, Some(RemoteId::new(120).unwrap()));
    assert!(data.extra.contains_key("created_at"));
}

#[tokio::test]
async fn test_create_post_under_entity() {
    let (server, remote) = common::setup_kanka_mock().await;
    common::mount_create(&server, "entities/120/posts", 201, json!({"id": 9, "name": "Rules"})).await;

    let resource = Resource::Post {
        entity_id: RemoteId::new(120).unwrap(),
    };
    let response = remote
        .create(account(), &resource, &json!({"name": "Rules"}))
        .await
        .unwrap();
    assert_eq!(response.id(), Some(RemoteId::new(9).unwrap()));
}

#[tokio::test]
async fn test_create_rejected_returns_status() {
    let (server, remote) = common::setup_kanka_mock().await;
    Mock::given(method("POST"))
        .and(path(format!("/{CAMPAIGN}/tags")))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "The name field is required.",
            "errors": {"name": ["The name field is required."]}
        })))
        .mount(&server)
        .await;

    let response = remote
        .create(account(), &Resource::Tag, &json!({"name": ""}))
        .await
        .expect("a rejected create is still a response");
    assert_eq!(response.status, 422);
    assert!(!response.is_success());
    assert!(response.body.is_none());
}

#[tokio::test]
async fn test_create_undefined_type_is_error() {
    let (_server, remote) = common::setup_kanka_mock().await;
    let result = remote
        .create(account(), &Resource::Entity(EntityType::Undefined), &json!({}))
        .await;
    assert!(result.is_err());
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_uses_patch_with_id() {
    let (server, remote) = common::setup_kanka_mock().await;
    common::mount_update(&server, "locations", 5, 200, json!({"id": 5, "name": "Town"})).await;

    let response = remote
        .update(
            account(),
            &Resource::Entity(EntityType::Location),
            RemoteId::new(5).unwrap(),
            &json!({"name": "Town"}),
        )
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body.unwrap().name.as_deref(), Some("Town"));
}

#[tokio::test]
async fn test_update_server_error_returns_status() {
    let (server, remote) = common::setup_kanka_mock().await;
    Mock::given(method("PATCH"))
        .and(path(format!("/{CAMPAIGN}/entities/120/posts/9")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let id = RemoteId::new(9).unwrap();
    let resource = Resource::Post {
        entity_id: RemoteId::new(120).unwrap(),
    };
    let response = remote
        .update(account(), &resource, id, &json!({}))
        .await
        .unwrap();
    assert_eq!(response.status, 503);
    assert!(!response.is_success());
}

#[tokio::test]
async fn test_update_unreachable_server_is_error() {
    let remote = KankaRemoteClient::new(KankaClient::with_base_url("t", "http://127.0.0.1:9"));
    let result = remote
        .update(
            account(),
            &Resource::Tag,
            RemoteId::new(1).unwrap(),
            &json!({}),
        )
        .await;
    assert!(result.is_err());
}
