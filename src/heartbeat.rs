//! Periodic self-ping of the public health URL, which keeps hosts that idle
//! inactive web processes awake.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::reply::format_uptime;
use crate::server::ServerContext;

const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Ping `url` once and record the result. Returns whether it succeeded.
pub async fn ping_once(client: &Client, url: &str, server: &ServerContext) -> bool {
    let ok = match client.get(url).send().await {
        Ok(response) if response.status().is_success() => true,
        Ok(response) => {
            warn!(status = %response.status(), "Heartbeat got unexpected status");
            false
        }
        Err(e) => {
            warn!(error = %e, "Heartbeat request failed");
            false
        }
    };

    server.record_heartbeat(ok);
    ok
}

/// Spawn the heartbeat loop. The first ping happens one `interval` after start.
pub fn spawn_heartbeat(url: String, interval: Duration, server: Arc<ServerContext>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = match Client::builder().timeout(PING_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Failed to build heartbeat client, heartbeat disabled");
                return;
            }
        };

        info!(url = %url, interval_secs = interval.as_secs(), "Heartbeat started");

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let ok = ping_once(&client, &url, &server).await;
            debug!(ok = ok, "Heartbeat sent");
            info!(
                uptime = %format_uptime(server.uptime()),
                heartbeats_ok = server.heartbeats_ok(),
                heartbeats_failed = server.heartbeats_failed(),
                "Bot alive"
            );
        }
    })
}
