//! # Order Submission Module
//!
//! Posts orders to the spreadsheet endpoint. Each order is sent exactly once:
//! the endpoint has no idempotency key, so a failed or timed out attempt is
//! reported to the user instead of being retried.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{redirect, Client, StatusCode};
use tracing::{debug, error, info};

use crate::order::{OrderOutcome, OrderRequest};

/// Timeout applied to a single submission when none is configured
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum number of response body characters written to the log
const LOGGED_BODY_MAX_CHARS: usize = 500;

/// Destination for completed orders
pub trait OrderSubmitter: Send + Sync {
    fn submit(&self, order: &OrderRequest) -> impl Future<Output = OrderOutcome> + Send;
}

/// Whether a response status means the row was written.
///
/// Apps Script web apps answer a POST with a 302 to the script output, so a
/// redirect counts as success.
pub fn is_success_status(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::FOUND
}

/// Client for the spreadsheet web app
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: Client,
    endpoint: String,
    timeout: Duration,
}

impl SheetsClient {
    /// Create a client posting to `endpoint`
    ///
    /// Redirects are not followed: the row is written by the first request and
    /// the redirect target only echoes the script output.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn exchange(&self, order: &OrderRequest) -> OrderOutcome {
        let response = match self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(order)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                error!(client_id = %order.client_id, error = %e, "Order submission timed out");
                return OrderOutcome::TimedOut;
            }
            Err(e) => {
                error!(client_id = %order.client_id, error = %e, "Order submission transport failure");
                // The endpoint URL carries the deployment id, keep it out of user replies
                return OrderOutcome::rejected(e.without_url().to_string());
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                error!(client_id = %order.client_id, error = %e, "Timed out reading submission response");
                return OrderOutcome::TimedOut;
            }
            Err(e) => {
                debug!(error = %e, "Submission response body unreadable");
                String::new()
            }
        };

        let logged_body: String = body.chars().take(LOGGED_BODY_MAX_CHARS).collect();
        info!(status = %status, body = %logged_body, "Spreadsheet endpoint responded");

        if is_success_status(status) {
            OrderOutcome::Accepted
        } else {
            error!(status = %status, client_id = %order.client_id, "Unexpected status from spreadsheet endpoint");
            OrderOutcome::rejected(format!("HTTP {}", status.as_u16()))
        }
    }
}

impl OrderSubmitter for SheetsClient {
    async fn submit(&self, order: &OrderRequest) -> OrderOutcome {
        info!(
            client_id = %order.client_id,
            service = %order.service_label,
            "Submitting order"
        );

        match tokio::time::timeout(self.timeout, self.exchange(order)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                error!(
                    client_id = %order.client_id,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Order submission timed out"
                );
                OrderOutcome::TimedOut
            }
        }
    }
}
