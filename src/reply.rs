//! Reply rendering: turns handler results into outbound message content.
//!
//! Everything here is a pure template fill over the bundled Fluent messages,
//! so rendering the same result twice yields identical output.

use std::time::Duration;

use teloxide::utils::html;

use crate::catalog::{self, CANCEL_ACTION};
use crate::localization::{t, t_args};
use crate::order::{OrderReceipt, PLACED_AT_FORMAT};

pub const MENU_SERVICES: &str = "📊 Услуги";
pub const MENU_PORTFOLIO: &str = "🖥 Портфолио";
pub const MENU_CONTACTS: &str = "📞 Контакты";
pub const MENU_ORDER: &str = "🛒 Заказать";

/// Buttons of the persistent reply menu, one per row
pub const MAIN_MENU_BUTTONS: [&str; 4] = [MENU_SERVICES, MENU_PORTFOLIO, MENU_CONTACTS, MENU_ORDER];

/// Static replies that need no runtime data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedReply {
    Welcome,
    Help,
    Services,
    Portfolio,
    Contacts,
    Greeting,
    Timeline,
    Payment,
    OrderHint,
    TopicsHint,
    NotUnderstood,
}

impl CannedReply {
    fn message_key(self) -> &'static str {
        match self {
            CannedReply::Welcome => "welcome",
            CannedReply::Help => "help",
            CannedReply::Services => "services",
            CannedReply::Portfolio => "portfolio",
            CannedReply::Contacts => "contacts",
            CannedReply::Greeting => "keyword-greeting",
            CannedReply::Timeline => "keyword-timeline",
            CannedReply::Payment => "keyword-payment",
            CannedReply::OrderHint => "keyword-order-hint",
            CannedReply::TopicsHint => "topics-hint",
            CannedReply::NotUnderstood => "not-understood",
        }
    }

    fn menu(self) -> Option<MenuSpec> {
        match self {
            CannedReply::Welcome
            | CannedReply::Help
            | CannedReply::Greeting
            | CannedReply::OrderHint
            | CannedReply::NotUnderstood => Some(MenuSpec::MainMenu),
            _ => None,
        }
    }
}

/// How the bot is receiving updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Webhook,
    Polling,
}

/// Live figures shown by `/status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub mode: DeliveryMode,
    pub uptime: Duration,
    pub updates_received: u64,
    pub heartbeats: u64,
}

/// What a handler decided to tell the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResult {
    Canned(CannedReply),
    Status(StatusReport),
    OrderMenu,
    OrderCancelled,
    OrderAccepted(OrderReceipt),
    OrderTimedOut,
    OrderRejected { reason_summary: String },
    ServiceNotFound,
    MenuExpired,
    TechnicalError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    PlainText,
    RichText,
}

/// Keyboard attached to an outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuSpec {
    /// Persistent reply keyboard with the four main buttons
    MainMenu,
    /// One-shot inline menu: `(label, action id)` rows
    Inline(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub format: TextFormat,
    pub menu: Option<MenuSpec>,
}

/// Transient notification shown when answering a button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub text: String,
    pub show_alert: bool,
}

/// Response to a button press: an optional alert and an optional
/// replacement for the menu message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackReply {
    pub alert: Option<Alert>,
    pub replacement: Option<OutboundMessage>,
}

impl OutboundMessage {
    fn rich(text: String) -> Self {
        Self {
            text,
            format: TextFormat::RichText,
            menu: None,
        }
    }

    fn with_menu(mut self, menu: Option<MenuSpec>) -> Self {
        self.menu = menu;
        self
    }
}

/// The inline order menu: every catalog entry plus a cancel row
pub fn order_menu() -> MenuSpec {
    let mut rows: Vec<(String, String)> = catalog::CATALOG
        .iter()
        .map(|entry| (entry.button_label(), entry.key.to_string()))
        .collect();
    rows.push((t("order-menu-cancel"), CANCEL_ACTION.to_string()));
    MenuSpec::Inline(rows)
}

/// Render uptime as "1 д 02:03:04" or "02:03:04"
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    if days > 0 {
        format!("{days} д {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

/// Render a handler result as a message
pub fn render(result: &HandlerResult) -> OutboundMessage {
    match result {
        HandlerResult::Canned(reply) => {
            let format = match reply {
                CannedReply::Welcome | CannedReply::NotUnderstood | CannedReply::Greeting => {
                    TextFormat::PlainText
                }
                _ => TextFormat::RichText,
            };
            OutboundMessage {
                text: t(reply.message_key()),
                format,
                menu: reply.menu(),
            }
        }
        HandlerResult::Status(report) => {
            let mode = match report.mode {
                DeliveryMode::Webhook => t("status-mode-webhook"),
                DeliveryMode::Polling => t("status-mode-polling"),
            };
            let uptime = format_uptime(report.uptime);
            let updates = report.updates_received.to_string();
            let heartbeats = report.heartbeats.to_string();
            OutboundMessage::rich(t_args(
                "status",
                &[
                    ("mode", mode.as_str()),
                    ("uptime", uptime.as_str()),
                    ("updates", updates.as_str()),
                    ("heartbeats", heartbeats.as_str()),
                ],
            ))
        }
        HandlerResult::OrderMenu => {
            OutboundMessage::rich(t("order-menu")).with_menu(Some(order_menu()))
        }
        HandlerResult::OrderCancelled => OutboundMessage::rich(t("order-cancelled")),
        HandlerResult::OrderAccepted(receipt) => {
            let date = receipt.placed_at.format(PLACED_AT_FORMAT).to_string();
            // User-supplied names must not break HTML parsing
            let client = html::escape(&receipt.client_name);
            let service = html::escape(&receipt.service_label);
            OutboundMessage::rich(t_args(
                "order-accepted",
                &[
                    ("emoji", receipt.emoji.as_str()),
                    ("client", client.as_str()),
                    ("service", service.as_str()),
                    ("price", receipt.price_text.as_str()),
                    ("date", date.as_str()),
                ],
            ))
        }
        HandlerResult::OrderTimedOut => OutboundMessage::rich(t("order-timeout")),
        HandlerResult::OrderRejected { reason_summary } => {
            let reason = html::escape(reason_summary);
            OutboundMessage::rich(t_args("order-rejected", &[("reason", reason.as_str())]))
        }
        HandlerResult::ServiceNotFound => OutboundMessage {
            text: t("service-not-found-alert"),
            format: TextFormat::PlainText,
            menu: None,
        },
        HandlerResult::MenuExpired => OutboundMessage {
            text: t("menu-expired-alert"),
            format: TextFormat::PlainText,
            menu: None,
        },
        HandlerResult::TechnicalError => OutboundMessage {
            text: t("technical-error"),
            format: TextFormat::PlainText,
            menu: Some(MenuSpec::MainMenu),
        },
    }
}

/// Render the answer to a button press
pub fn render_callback(result: &HandlerResult) -> CallbackReply {
    let alert = |key: &str, show_alert: bool| {
        Some(Alert {
            text: t(key),
            show_alert,
        })
    };

    match result {
        HandlerResult::OrderCancelled => CallbackReply {
            alert: None,
            replacement: Some(render(result)),
        },
        HandlerResult::OrderAccepted(_) => CallbackReply {
            alert: alert("order-accepted-alert", false),
            replacement: Some(render(result)),
        },
        HandlerResult::OrderTimedOut => CallbackReply {
            alert: alert("order-timeout-alert", true),
            replacement: Some(render(result)),
        },
        HandlerResult::OrderRejected { .. } => CallbackReply {
            alert: alert("order-rejected-alert", true),
            replacement: Some(render(result)),
        },
        HandlerResult::ServiceNotFound => CallbackReply {
            alert: alert("service-not-found-alert", true),
            replacement: None,
        },
        HandlerResult::MenuExpired => CallbackReply {
            alert: alert("menu-expired-alert", true),
            replacement: None,
        },
        HandlerResult::TechnicalError => CallbackReply {
            alert: alert("technical-error-alert", true),
            replacement: None,
        },
        // Results that are not button outcomes never edit the menu
        _ => CallbackReply {
            alert: None,
            replacement: None,
        },
    }
}
