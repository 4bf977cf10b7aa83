//! Integration tests against a mock Graph API.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use graph_ads::{AdsClient, AdsError};

#[tokio::test]
async fn maps_ad_adset_and_campaign_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/120210000000000001"))
        .and(query_param(
            "fields",
            "name,adset_id,adset.fields(name),campaign_id,campaign.fields(name)",
        ))
        .and(query_param("access_token", "fb-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "120210000000000001",
            "name": "Promo Junho - Anúncio 1",
            "adset_id": "238100",
            "adset": { "id": "238100", "name": "Conjunto A" },
            "campaign_id": "900100",
            "campaign": { "id": "900100", "name": "Campanha Junho" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AdsClient::new("fb-token")
        .unwrap()
        .with_base_url(server.uri());
    let details = client.ad_details("120210000000000001").await.unwrap();

    assert_eq!(details.ad_name.as_deref(), Some("Promo Junho - Anúncio 1"));
    assert_eq!(details.adset_id.as_deref(), Some("238100"));
    assert_eq!(details.adset_name.as_deref(), Some("Conjunto A"));
    assert_eq!(details.campaign_id.as_deref(), Some("900100"));
    assert_eq!(details.campaign_name.as_deref(), Some("Campanha Junho"));
}

#[tokio::test]
async fn partial_responses_leave_missing_fields_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/120210000000000002"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "120210000000000002",
            "name": "Anúncio órfão"
        })))
        .mount(&server)
        .await;

    let client = AdsClient::new("fb-token")
        .unwrap()
        .with_base_url(server.uri());
    let details = client.ad_details("120210000000000002").await.unwrap();

    assert_eq!(details.ad_name.as_deref(), Some("Anúncio órfão"));
    assert_eq!(details.adset_id, None);
    assert_eq!(details.adset_name, None);
    assert_eq!(details.campaign_name, None);
}

#[tokio::test]
async fn api_rejection_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/120210000000000003"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "Unsupported get request", "code": 100 }
        })))
        .mount(&server)
        .await;

    let client = AdsClient::new("fb-token")
        .unwrap()
        .with_base_url(server.uri());
    let err = client.ad_details("120210000000000003").await.unwrap_err();

    match err {
        AdsError::Api { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("Unsupported"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}
