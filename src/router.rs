//! Maps inbound events to exactly one handler.
//!
//! Precedence, first match wins:
//! 1. exact command
//! 2. exact main-menu button label
//! 3. keyword table, in declaration order
//! 4. trailing `?` hint
//! 5. "not understood" fallback

use crate::catalog::{self, ServiceCatalogEntry, CANCEL_ACTION};
use crate::events::InboundEvent;
use crate::reply::{CannedReply, HandlerResult, MENU_CONTACTS, MENU_ORDER, MENU_PORTFOLIO, MENU_SERVICES};

/// Handler chosen for an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Answer with a reply that needs no further processing
    Reply(HandlerResult),
    /// Answer with the live status report
    Status,
    /// Send the inline order menu and start an order session
    OpenOrderMenu,
    CancelOrder,
    SelectService(&'static ServiceCatalogEntry),
    /// Button press carrying an id outside the catalog
    UnknownSelection(String),
}

/// A keyword-triggered canned reply
#[derive(Debug)]
pub struct KeywordRule {
    /// Lower-case substrings, any of which triggers the rule
    pub keywords: &'static [&'static str],
    pub reply: CannedReply,
}

pub static KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["привет", "здравствуй", "добрый день", "добрый вечер", "доброе утро"],
        reply: CannedReply::Greeting,
    },
    KeywordRule {
        keywords: &["цена", "цены", "стоимость", "стоит", "прайс", "сколько"],
        reply: CannedReply::Services,
    },
    KeywordRule {
        keywords: &["срок", "когда", "как долго", "быстро"],
        reply: CannedReply::Timeline,
    },
    KeywordRule {
        keywords: &["оплат", "предоплат", "карт", "счет", "счёт"],
        reply: CannedReply::Payment,
    },
    KeywordRule {
        keywords: &["портфолио", "пример", "отзыв", "работы"],
        reply: CannedReply::Portfolio,
    },
    KeywordRule {
        keywords: &["контакт", "связаться", "телефон", "почта", "email"],
        reply: CannedReply::Contacts,
    },
    KeywordRule {
        keywords: &["заказ", "купить", "заказать"],
        reply: CannedReply::OrderHint,
    },
];

fn route_command(name: &str) -> Option<Route> {
    match name {
        "start" => Some(Route::Reply(HandlerResult::Canned(CannedReply::Welcome))),
        "help" => Some(Route::Reply(HandlerResult::Canned(CannedReply::Help))),
        "status" => Some(Route::Status),
        _ => None,
    }
}

fn route_menu_label(text: &str) -> Option<Route> {
    match text {
        MENU_SERVICES => Some(Route::Reply(HandlerResult::Canned(CannedReply::Services))),
        MENU_PORTFOLIO => Some(Route::Reply(HandlerResult::Canned(CannedReply::Portfolio))),
        MENU_CONTACTS => Some(Route::Reply(HandlerResult::Canned(CannedReply::Contacts))),
        MENU_ORDER => Some(Route::OpenOrderMenu),
        _ => None,
    }
}

/// First keyword rule matching the message, in table order
pub fn match_keywords(text: &str) -> Option<CannedReply> {
    let lowered = text.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|rule| rule.reply)
}

fn route_text(text: &str) -> Route {
    if let Some(route) = route_menu_label(text) {
        return route;
    }

    if let Some(reply) = match_keywords(text) {
        return Route::Reply(HandlerResult::Canned(reply));
    }

    if text.trim_end().ends_with('?') {
        return Route::Reply(HandlerResult::Canned(CannedReply::TopicsHint));
    }

    Route::Reply(HandlerResult::Canned(CannedReply::NotUnderstood))
}

fn route_callback(action_id: &str) -> Route {
    if action_id == CANCEL_ACTION {
        return Route::CancelOrder;
    }

    match catalog::resolve(action_id) {
        Some(entry) => Route::SelectService(entry),
        None => Route::UnknownSelection(action_id.to_string()),
    }
}

/// Pick the handler for an event. Pure, no side effects.
pub fn route(event: &InboundEvent) -> Route {
    match event {
        InboundEvent::Command { name } => route_command(name)
            .unwrap_or(Route::Reply(HandlerResult::Canned(CannedReply::NotUnderstood))),
        InboundEvent::TextMessage { text, .. } => route_text(text),
        InboundEvent::CallbackAction { action_id, .. } => route_callback(action_id),
    }
}
