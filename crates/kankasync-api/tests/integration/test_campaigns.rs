//! Integration tests for the campaign index

use kankasync_core::domain::AccountId;
use kankasync_core::ports::IRemoteClient;
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::common;

#[tokio::test]
async fn test_list_campaigns_maps_boost_tiers() {
    let (server, remote) = common::setup_kanka_mock().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 3, "name": "Third", "premium": true}],
            "links": {"next": null}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 1, "name": "First", "boosted": false, "superboosted": false},
                {"id": 2, "name": "Second", "boosted": true}
            ],
            "links": {"next": format!("{}/?page=2", server.uri())}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let campaigns = remote.list_campaigns().await.unwrap();
    assert_eq!(campaigns.len(), 3);
    assert_eq!(campaigns[0].id, AccountId::new(1));
    assert!(!campaigns[0].boosted);
    assert!(campaigns[1].boosted);
    assert_eq!(campaigns[2].name, "Third");
    assert!(campaigns[2].boosted);
}

#[tokio::test]
async fn test_list_campaigns_unauthorized() {
    let (server, remote) = common::setup_kanka_mock().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(remote.list_campaigns().await.is_err());
}
