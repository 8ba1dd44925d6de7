//! Matching broker client against a mock broker.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use matching_service::config::MatchingSettings;
use matching_service::infrastructure::integrations::payloads::{
    AckRequest, BrokerMessage, Destination, SubscribeRequest,
};
use matching_service::infrastructure::integrations::{
    HttpMatchingClient, IntegrationError, MatchingApi,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> MatchingSettings {
    let mut settings = MatchingSettings {
        base_url: format!("{}/", server.uri()),
        api_key: Some("test-key-123".to_string()),
        ack_path: "messages/{msgId}/ack".to_string(),
        ..MatchingSettings::default()
    };
    settings.validate().unwrap();
    settings
}

fn subscribe_request() -> SubscribeRequest {
    SubscribeRequest {
        webhook_url: " https://matching.example.com/api/webhook ".to_string(),
        squad_name: "matching".to_string(),
        topic: "solicitudes.solicitud.creada".to_string(),
        event_name: "creada".to_string(),
    }
}

#[tokio::test]
async fn subscribe_sends_api_key_and_trimmed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/subscribe"))
        .and(header("X-API-KEY", "test-key-123"))
        .and(body_partial_json(json!({
            "webhookUrl": "https://matching.example.com/api/webhook",
            "squadName": "matching",
            "topic": "solicitudes.solicitud.creada",
            "eventName": "creada"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id":"sub-1"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpMatchingClient::from_settings(&settings(&server)).unwrap();
    let response = client.subscribe(&subscribe_request()).await.unwrap();

    assert_eq!(response.status, 201);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["id"], "sub-1");
}

#[tokio::test]
async fn subscribe_rejection_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/subscribe"))
        .respond_with(ResponseTemplate::new(409).set_body_string("La suscripción ya existe"))
        .mount(&server)
        .await;

    let client = HttpMatchingClient::from_settings(&settings(&server)).unwrap();
    let err = client.subscribe(&subscribe_request()).await.unwrap_err();

    assert!(matches!(err, IntegrationError::Http { status: 409, .. }));
    assert_eq!(err.response_status(), 409);
    assert!(err.detail().contains("ya existe"));
}

#[tokio::test]
async fn list_parses_partial_subscription_objects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/subscribe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "subscriptionId": "a1",
                "webhookUrl": "https://matching.example.com/api/webhook",
                "topic": "solicitudes.solicitud.creada",
                "eventName": "creada",
                "extra": true
            },
            { "subscriptionId": "b2" }
        ])))
        .mount(&server)
        .await;

    let client = HttpMatchingClient::from_settings(&settings(&server)).unwrap();
    let list = client.list_subscriptions().await.unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(list[0].subscription_id.as_deref(), Some("a1"));
    assert!(list[0].targets_webhook("HTTPS://matching.example.com/api/webhook"));
    assert!(list[1].topic.is_none());
}

#[tokio::test]
async fn list_with_non_array_body_is_a_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/subscribe"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = HttpMatchingClient::from_settings(&settings(&server)).unwrap();
    let err = client.list_subscriptions().await.unwrap_err();

    assert!(matches!(err, IntegrationError::Protocol { .. }));
    assert_eq!(err.response_status(), 502);
}

#[tokio::test]
async fn acknowledge_substitutes_message_id_in_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages/msg-42/ack"))
        .and(header("X-API-KEY", "test-key-123"))
        .and(body_partial_json(json!({
            "msgId": "msg-42",
            "subscriptionId": "sub-7"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpMatchingClient::from_settings(&settings(&server)).unwrap();
    let ack = AckRequest {
        msg_id: "msg-42".to_string(),
        subscription_id: "sub-7".to_string(),
    };

    assert_eq!(client.acknowledge(&ack).await.unwrap().status, 200);
}

#[tokio::test]
async fn unsubscribe_appends_id_to_subscribe_path() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/subscribe/sub-9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpMatchingClient::from_settings(&settings(&server)).unwrap();

    assert_eq!(client.unsubscribe(" sub-9 ").await.unwrap().status, 204);
}

#[tokio::test]
async fn publish_posts_destination_and_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/publish"))
        .and(body_partial_json(json!({
            "source": "matching",
            "destination": {
                "channel": "matching.solicitudes.top3",
                "eventName": "top3_generado"
            },
            "payload": { "solicitudId": 7 }
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpMatchingClient::from_settings(&settings(&server)).unwrap();
    let message = BrokerMessage::new(
        "matching",
        Destination {
            channel: "matching.solicitudes.top3".to_string(),
            event_name: "top3_generado".to_string(),
        },
        json!({ "solicitudId": 7 }),
    );

    assert_eq!(client.publish(&message).await.unwrap().status, 202);
}

#[tokio::test]
async fn unreachable_broker_maps_to_bad_gateway() {
    let mut settings = MatchingSettings {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_ms: 500,
        ..MatchingSettings::default()
    };
    settings.validate().unwrap();

    let client = HttpMatchingClient::from_settings(&settings).unwrap();
    let err = client.list_subscriptions().await.unwrap_err();

    assert!(err.is_connectivity());
    assert_eq!(err.response_status(), 502);
}
