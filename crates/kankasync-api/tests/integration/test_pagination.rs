//! Integration tests for paginated collection listing

use kankasync_api::ApiError;
use kankasync_core::domain::{AccountId, RemoteId};
use kankasync_core::ports::{IRemoteClient, Resource};
use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

use crate::common::{self, CAMPAIGN};

#[tokio::test]
async fn test_list_follows_next_links() {
    let (server, remote) = common::setup_kanka_mock().await;
    common::mount_tags_paginated(
        &server,
        json!([{"id": 1, "name": "npc"}, {"id": 2, "name": "villain"}]),
        json!([{"id": 3, "name": "city"}]),
    )
    .await;

    let account = AccountId::new(CAMPAIGN);
    let mut names = Vec::new();
    let mut cursor: Option<String> = None;
    let mut calls = 0;
    loop {
        let page = remote
            .list(account, &Resource::Tag, cursor.as_deref())
            .await
            .expect("list page");
        calls += 1;
        names.extend(page.items.into_iter().filter_map(|t| t.name));
        cursor = page.next_page;
        if cursor.is_none() {
            break;
        }
    }

    assert_eq!(calls, 2);
    assert_eq!(names, vec!["npc", "villain", "city"]);
}

#[tokio::test]
async fn test_list_items_keep_extra_fields() {
    let (server, remote) = common::setup_kanka_mock().await;
    Mock::given(method("GET"))
        .and(path(format!("/{CAMPAIGN}/tags")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 7, "name": "npc", "colour": "red", "entity_id": 70}],
            "links": {"next": null}
        })))
        .mount(&server)
        .await;

    let page = remote
        .list(AccountId::new(CAMPAIGN), &Resource::Tag, None)
        .await
        .unwrap();
    assert!(page.next_page.is_none());
    let tag = &page.items[0];
    assert_eq!(tag.id, Some(RemoteId::new(7).unwrap()));
    assert_eq!(tag.entity_id, Some(RemoteId::new(70).unwrap()));
    assert_eq!(tag.extra["colour"], "red");
}

#[tokio::test]
async fn test_list_error_status_is_error() {
    let (server, remote) = common::setup_kanka_mock().await;
    Mock::given(method("GET"))
        .and(path(format!("/{CAMPAIGN}/tags")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Unauthenticated."
        })))
        .mount(&server)
        .await;

    let err = remote
        .list(AccountId::new(CAMPAIGN), &Resource::Tag, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_list_rate_limited_is_error() {
    let (server, remote) = common::setup_kanka_mock().await;
    Mock::given(method("GET"))
        .and(path(format!("/{CAMPAIGN}/tags")))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = remote
        .list(AccountId::new(CAMPAIGN), &Resource::Tag, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::TooManyRequests(_))
    ));
}

#[tokio::test]
async fn test_list_malformed_body_is_error() {
    let (server, remote) = common::setup_kanka_mock().await;
    Mock::given(method("GET"))
        .and(path(format!("/{CAMPAIGN}/tags")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = remote
        .list(AccountId::new(CAMPAIGN), &Resource::Tag, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::InvalidResponse(_))
    ));
}
