//! End-to-end delivery tests against a mock webhook server.

use std::sync::Arc;

use serde_json::json;
use slackwire::{
    Account, AccountConfig, MessageDefaults, MessageTemplate, PlaceholderEngine, ReqwestTransport,
    SlackMessage,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn account_for(server: &MockServer, default_to: Vec<String>) -> Account {
    let settings = AccountConfig {
        url: Some(format!("{}/webhook", server.uri())),
        message_defaults: MessageDefaults {
            to: default_to,
            ..Default::default()
        },
    };
    Account::new(
        "ops",
        &settings,
        &AccountConfig::default(),
        Arc::new(ReqwestTransport::default()),
    )
    .unwrap()
}

#[tokio::test]
async fn resolved_message_posts_exactly_the_expected_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .and(body_json(json!({"channel": "#ops", "text": "alert fired"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let account = account_for(&server, vec![]);
    let message = SlackMessage {
        to: vec!["#ops".to_string()],
        text: Some("alert fired".to_string()),
        ..Default::default()
    };

    let sent = account.send(&message).await;

    assert_eq!(sent.account(), "ops");
    assert_eq!(sent.count(), 1);
    assert!(sent.iter().all(|m| m.is_responded()));
}

#[tokio::test]
async fn rendered_template_uses_default_channels_and_watch_id_sender() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .and(body_json(json!({
            "channel": "#ops",
            "username": "watch_1",
            "text": "2 hits"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let account = account_for(&server, vec!["#ops".to_string()]);

    let template =
        MessageTemplate::parse(&json!({"text": "{{ctx.payload.hits}} hits"})).unwrap();
    let message = template
        .render(
            "watch_1",
            "notify-ops",
            &PlaceholderEngine,
            &json!({"ctx": {"payload": {"hits": 2}}}),
            account.message_defaults(),
        )
        .unwrap();

    let sent = account.send(&message).await;
    assert_eq!(sent.count(), 1);
    assert!(sent.iter().next().unwrap().is_responded());
}

#[tokio::test]
async fn an_error_status_is_still_a_responded_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(500).set_body_string("channel_not_found"))
        .expect(1)
        .mount(&server)
        .await;

    let account = account_for(&server, vec![]);
    let message = SlackMessage {
        text: Some("alert fired".to_string()),
        ..Default::default()
    };

    let sent = account.send(&message).await;

    let only = sent.iter().next().unwrap();
    assert!(only.is_responded());
    match only.delivery() {
        slackwire::Delivery::Responded(response) => {
            assert_eq!(response.status, 500);
            assert_eq!(response.body, "channel_not_found");
        }
        other => panic!("expected a responded outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn a_failed_exchange_is_an_errored_outcome_with_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(100))
        .build()
        .unwrap();
    let settings = AccountConfig {
        url: Some(format!("{}/webhook", server.uri())),
        ..Default::default()
    };
    let account = Account::new(
        "ops",
        &settings,
        &AccountConfig::default(),
        Arc::new(ReqwestTransport::new(client)),
    )
    .unwrap();

    let message = SlackMessage {
        text: Some("alert fired".to_string()),
        ..Default::default()
    };

    let sent = account.send(&message).await;

    assert_eq!(sent.count(), 1);
    let only = sent.iter().next().unwrap();
    assert!(!only.is_responded());
    assert!(!only.error().unwrap().is_empty());
}

#[tokio::test]
async fn fan_out_posts_once_per_channel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let account = account_for(&server, vec![]);
    let message = SlackMessage {
        to: vec!["#ops".to_string(), "#oncall".to_string()],
        text: Some("alert fired".to_string()),
        ..Default::default()
    };

    let sent = account.send(&message).await;

    assert_eq!(sent.count(), 2);
    let channels: Vec<_> = sent.iter().map(|m| m.to().unwrap().to_string()).collect();
    assert_eq!(channels, vec!["#ops", "#oncall"]);
}
