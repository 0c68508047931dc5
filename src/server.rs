//! Webhook delivery: the HTTP endpoint Telegram pushes updates to, plus the
//! liveness endpoints used by the hosting platform.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use reqwest::Url;
use teloxide::prelude::*;
use tracing::{info, warn};

use crate::bot::{self, BotContext};
use crate::config::WEBHOOK_PATH;
use crate::reply::format_uptime;

/// Process-wide runtime figures, created once at startup and shared with
/// the HTTP server, the heartbeat task and the `/status` command
#[derive(Debug)]
pub struct ServerContext {
    started_at: Instant,
    updates_received: AtomicU64,
    heartbeats_ok: AtomicU64,
    heartbeats_failed: AtomicU64,
}

impl ServerContext {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            updates_received: AtomicU64::new(0),
            heartbeats_ok: AtomicU64::new(0),
            heartbeats_failed: AtomicU64::new(0),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn record_update(&self) {
        self.updates_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_heartbeat(&self, ok: bool) {
        if ok {
            self.heartbeats_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.heartbeats_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn updates_received(&self) -> u64 {
        self.updates_received.load(Ordering::Relaxed)
    }

    pub fn heartbeats_ok(&self) -> u64 {
        self.heartbeats_ok.load(Ordering::Relaxed)
    }

    pub fn heartbeats_failed(&self) -> u64 {
        self.heartbeats_failed.load(Ordering::Relaxed)
    }

    /// Plain-text body of the liveness endpoints
    pub fn health_report(&self) -> String {
        format!(
            "Bot is running!\nUptime: {}\nUpdates: {}\nHeartbeats: {} ok, {} failed\n",
            format_uptime(self.uptime()),
            self.updates_received(),
            self.heartbeats_ok(),
            self.heartbeats_failed()
        )
    }
}

impl Default for ServerContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct WebhookState {
    bot: Bot,
    ctx: Arc<BotContext>,
}

/// Build the router serving the webhook and liveness paths
pub fn router(bot: Bot, ctx: Arc<BotContext>) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(webhook_handler))
        .route("/health", get(health_handler))
        .route("/", get(health_handler))
        .with_state(WebhookState { bot, ctx })
}

/// `POST /webhook` - always acknowledged with 200 so Telegram does not
/// redeliver; each update is processed on its own task
async fn webhook_handler(State(state): State<WebhookState>, body: Bytes) -> (StatusCode, &'static str) {
    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            tokio::spawn(bot::handle_update(state.bot.clone(), state.ctx.clone(), update));
        }
        Err(e) => {
            warn!(error = %e, body_len = body.len(), "Discarding malformed webhook payload");
        }
    }

    (StatusCode::OK, "OK")
}

/// `GET /health` and `GET /`
async fn health_handler(State(state): State<WebhookState>) -> String {
    state.ctx.server.health_report()
}

/// Replace any previous webhook with `url`, dropping pending updates
pub async fn register_webhook(bot: &Bot, url: &str) -> Result<()> {
    let url = Url::parse(url)?;

    bot.delete_webhook().drop_pending_updates(true).await?;
    bot.set_webhook(url.clone()).await?;
    info!(url = %url, "Webhook registered");

    let webhook_info = bot.get_webhook_info().await?;
    info!(
        pending_updates = webhook_info.pending_update_count,
        "Webhook status"
    );

    Ok(())
}

/// Serve the webhook router on `0.0.0.0:port` until Ctrl-C
pub async fn serve(bot: Bot, ctx: Arc<BotContext>, port: u16) -> Result<()> {
    let app = router(bot, ctx);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port = port, "Webhook server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let server = ServerContext::new();
        server.record_update();
        server.record_update();
        server.record_heartbeat(true);
        server.record_heartbeat(false);

        assert_eq!(server.updates_received(), 2);
        assert_eq!(server.heartbeats_ok(), 1);
        assert_eq!(server.heartbeats_failed(), 1);
    }

    #[test]
    fn test_health_report() {
        let server = ServerContext::new();
        server.record_heartbeat(true);

        let report = server.health_report();
        assert!(report.starts_with("Bot is running!"));
        assert!(report.contains("Heartbeats: 1 ok, 0 failed"));
    }
}
