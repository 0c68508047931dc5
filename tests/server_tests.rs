//! # Webhook Server Tests
//!
//! The webhook endpoint acknowledges every delivery and the liveness paths
//! report the running process.

mod support;

use reqwest::Url;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use teloxide::Bot;

use service_desk_bot::bot::BotContext;
use service_desk_bot::dispatcher::OrderDispatcher;
use service_desk_bot::reply::DeliveryMode;
use service_desk_bot::server::{self, ServerContext};
use service_desk_bot::submission::SheetsClient;

use support::closed_port_url;

/// Start the webhook router with a bot whose API is unreachable
async fn start_webhook_server() -> (String, Arc<ServerContext>) {
    let dead_api = closed_port_url().await;
    let submitter = SheetsClient::new(dead_api.clone(), Duration::from_secs(1)).unwrap();
    let server_ctx = Arc::new(ServerContext::new());
    let ctx = Arc::new(BotContext::new(
        OrderDispatcher::new(submitter),
        Arc::clone(&server_ctx),
        DeliveryMode::Webhook,
    ));

    let bot = Bot::new("123456:TEST-TOKEN").set_api_url(Url::parse(&dead_api).unwrap());
    let app = server::router(bot, ctx);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), server_ctx)
}

#[tokio::test]
async fn test_health_endpoints() {
    let (base, _) = start_webhook_server().await;
    let client = reqwest::Client::new();

    for path in ["/health", "/"] {
        let resp = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(resp.status(), 200);

        let body = resp.text().await.unwrap();
        assert!(body.starts_with("Bot is running!"));
        assert!(body.contains("Uptime:"));
    }
}

/// Malformed payloads are logged and still acknowledged
#[tokio::test]
async fn test_malformed_update_is_acknowledged() {
    let (base, _) = start_webhook_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/webhook"))
        .body("this is not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

/// Updates whose processing fails are acknowledged before processing ends
#[tokio::test]
async fn test_update_is_acknowledged_when_processing_fails() {
    let (base, _) = start_webhook_server().await;
    let client = reqwest::Client::new();

    let update = json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "date": 1_700_000_000,
            "chat": { "id": 4242, "type": "private", "first_name": "Test" },
            "from": { "id": 4242, "is_bot": false, "first_name": "Test" },
            "text": "/start"
        }
    });

    let resp = client
        .post(format!("{base}/webhook"))
        .json(&update)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
}

/// Only GET is served on the liveness paths and POST on the webhook
#[tokio::test]
async fn test_method_routing() {
    let (base, _) = start_webhook_server().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/webhook")).send().await.unwrap();
    assert_eq!(resp.status(), 405);

    let resp = client.get(format!("{base}/unknown")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

/// Health output includes the shared counters
#[tokio::test]
async fn test_health_reports_counters() {
    let (base, server_ctx) = start_webhook_server().await;
    server_ctx.record_heartbeat(true);
    server_ctx.record_heartbeat(true);

    let body = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("Heartbeats: 2 ok, 0 failed"));
}
