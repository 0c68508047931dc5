//! Inbound events, decoupled from the Telegram update types they are built from.

use teloxide::types::{CallbackQuery, Message, User};

/// Identity of the user behind an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: u64,
    pub display_name: String,
    pub handle: Option<String>,
}

/// Location of a message the bot sent, used to edit it later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

/// A user-originated occurrence delivered to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command {
        name: String,
    },
    TextMessage {
        text: String,
        sender: UserRef,
    },
    CallbackAction {
        action_id: String,
        sender: UserRef,
        origin_message: MessageRef,
    },
}

impl UserRef {
    pub fn from_telegram(user: &User) -> Self {
        let display_name = user.full_name();
        Self {
            id: user.id.0,
            display_name,
            handle: user.username.clone(),
        }
    }

    /// Someone we know nothing about, e.g. a channel post without a sender
    pub fn anonymous() -> Self {
        Self {
            id: 0,
            display_name: String::new(),
            handle: None,
        }
    }
}

impl MessageRef {
    pub fn of(msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id.0,
            message_id: msg.id.0,
        }
    }
}

/// Extract the command name from text like `/start@my_bot arg`
pub fn parse_command(text: &str) -> Option<String> {
    let rest = text.strip_prefix('/')?;
    let token = rest.split(char::is_whitespace).next()?;
    let name = token.split('@').next().unwrap_or(token);

    if name.is_empty() {
        None
    } else {
        Some(name.to_lowercase())
    }
}

/// Classify a text message event.
///
/// Messages without text (stickers, photos without caption) become an empty
/// text message so they fall through to the generic fallback reply.
pub fn text_event(text: &str, sender: UserRef) -> InboundEvent {
    match parse_command(text) {
        Some(name) => InboundEvent::Command { name },
        None => InboundEvent::TextMessage {
            text: text.to_string(),
            sender,
        },
    }
}

pub fn from_message(msg: &Message) -> InboundEvent {
    let text = msg.text().or(msg.caption()).unwrap_or_default();
    let sender = msg
        .from
        .as_ref()
        .map(UserRef::from_telegram)
        .unwrap_or_else(UserRef::anonymous);

    text_event(text, sender)
}

/// Build a callback event, or `None` when the query carries no data or its
/// origin message is unavailable
pub fn from_callback(q: &CallbackQuery) -> Option<InboundEvent> {
    let action_id = q.data.clone()?;
    let msg = q.message.as_ref()?;

    Some(InboundEvent::CallbackAction {
        action_id,
        sender: UserRef::from_telegram(&q.from),
        origin_message: MessageRef {
            chat_id: msg.chat().id.0,
            message_id: msg.id().0,
        },
    })
}
