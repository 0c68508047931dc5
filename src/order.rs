//! Order payloads and submission outcomes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::ServiceCatalogEntry;
use crate::events::UserRef;

/// Maximum number of characters of a failure diagnostic shown to users
pub const DIAGNOSTIC_MAX_CHARS: usize = 100;

/// Timestamp layout shared by the spreadsheet note and the chat receipt
pub const PLACED_AT_FORMAT: &str = "%d.%m.%Y %H:%M";

const UNKNOWN_NAME: &str = "Не указано";
const UNKNOWN_HANDLE: &str = "Не указан";

/// Status of a freshly submitted spreadsheet row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderStatus {
    #[serde(rename = "Новый")]
    New,
}

/// One order as it is posted to the spreadsheet endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub client_name: String,
    pub client_id: String,
    #[serde(rename = "service")]
    pub service_label: String,
    #[serde(rename = "price")]
    pub price_minor: i64,
    pub status: OrderStatus,
    #[serde(rename = "username")]
    pub handle: String,
    #[serde(rename = "comment")]
    pub note: String,
    #[serde(skip)]
    pub placed_at: DateTime<Utc>,
}

impl OrderRequest {
    pub fn new(entry: &ServiceCatalogEntry, sender: &UserRef, placed_at: DateTime<Utc>) -> Self {
        let client_name = if sender.display_name.trim().is_empty() {
            UNKNOWN_NAME.to_string()
        } else {
            sender.display_name.clone()
        };

        Self {
            client_name,
            client_id: sender.id.to_string(),
            service_label: entry.label.to_string(),
            price_minor: entry.price_minor,
            status: OrderStatus::New,
            handle: sender
                .handle
                .clone()
                .unwrap_or_else(|| UNKNOWN_HANDLE.to_string()),
            note: format!(
                "Заказ через Telegram-бота в {} UTC",
                placed_at.format(PLACED_AT_FORMAT)
            ),
            placed_at,
        }
    }
}

/// Result of a single submission attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    Accepted,
    TimedOut,
    Rejected { reason_summary: String },
}

impl OrderOutcome {
    pub fn rejected(diagnostic: impl AsRef<str>) -> Self {
        OrderOutcome::Rejected {
            reason_summary: truncate_diagnostic(diagnostic.as_ref()),
        }
    }
}

/// What the client sees after a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub emoji: String,
    pub client_name: String,
    pub service_label: String,
    pub price_text: String,
    pub placed_at: DateTime<Utc>,
}

impl OrderReceipt {
    pub fn new(entry: &ServiceCatalogEntry, order: &OrderRequest) -> Self {
        Self {
            emoji: entry.emoji.to_string(),
            client_name: order.client_name.clone(),
            service_label: order.service_label.clone(),
            price_text: entry.price_text(),
            placed_at: order.placed_at,
        }
    }
}

/// Keep the first characters of a diagnostic, respecting UTF-8 boundaries
pub fn truncate_diagnostic(diagnostic: &str) -> String {
    diagnostic.chars().take(DIAGNOSTIC_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use chrono::TimeZone;

    fn placed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_order_payload_fields() {
        let entry = catalog::resolve("order_excel").unwrap();
        let sender = UserRef {
            id: 1001,
            display_name: "Анна Смирнова".to_string(),
            handle: Some("anna".to_string()),
        };

        let order = OrderRequest::new(entry, &sender, placed_at());
        let payload = serde_json::to_value(&order).unwrap();

        assert_eq!(payload["client_name"], "Анна Смирнова");
        assert_eq!(payload["client_id"], "1001");
        assert_eq!(payload["service"], "Автоматизация Excel");
        assert_eq!(payload["price"], 1000);
        assert_eq!(payload["status"], "Новый");
        assert_eq!(payload["username"], "anna");
        assert_eq!(
            payload["comment"],
            "Заказ через Telegram-бота в 14.03.2025 09:30 UTC"
        );
        assert!(payload.get("placed_at").is_none());
    }

    #[test]
    fn test_order_defaults_for_missing_identity() {
        let entry = catalog::resolve("order_bot").unwrap();
        let order = OrderRequest::new(entry, &UserRef::anonymous(), placed_at());

        assert_eq!(order.client_name, "Не указано");
        assert_eq!(order.handle, "Не указан");
        assert_eq!(order.client_id, "0");
    }

    #[test]
    fn test_truncate_diagnostic() {
        let long = "é".repeat(250);
        let truncated = truncate_diagnostic(&long);
        assert_eq!(truncated.chars().count(), DIAGNOSTIC_MAX_CHARS);

        assert_eq!(truncate_diagnostic("HTTP 500"), "HTTP 500");
        assert_eq!(
            OrderOutcome::rejected("HTTP 500"),
            OrderOutcome::Rejected {
                reason_summary: "HTTP 500".to_string()
            }
        );
    }
}
