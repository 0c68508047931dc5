//! UI Builder module for creating keyboards and delivering rendered replies

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, MessageId,
    ParseMode, ReplyMarkup,
};

use crate::events::MessageRef;
use crate::localization::t;
use crate::reply::{Alert, MenuSpec, OutboundMessage, TextFormat, MAIN_MENU_BUTTONS};

/// Create the persistent main menu keyboard
pub fn main_menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(
        MAIN_MENU_BUTTONS
            .iter()
            .map(|label| vec![KeyboardButton::new(*label)]),
    )
    .resize_keyboard()
    .input_field_placeholder(t("main-menu-placeholder"))
}

/// Create an inline keyboard with one button per row
pub fn inline_keyboard(rows: &[(String, String)]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        rows.iter()
            .map(|(label, data)| vec![InlineKeyboardButton::callback(label.clone(), data.clone())]),
    )
}

pub fn reply_markup(menu: &MenuSpec) -> ReplyMarkup {
    match menu {
        MenuSpec::MainMenu => ReplyMarkup::Keyboard(main_menu_keyboard()),
        MenuSpec::Inline(rows) => ReplyMarkup::InlineKeyboard(inline_keyboard(rows)),
    }
}

fn parse_mode(format: TextFormat) -> Option<ParseMode> {
    match format {
        TextFormat::RichText => Some(ParseMode::Html),
        TextFormat::PlainText => None,
    }
}

/// Send a rendered reply to a chat
pub async fn send_outbound(bot: &Bot, chat_id: ChatId, message: &OutboundMessage) -> Result<Message> {
    let mut request = bot.send_message(chat_id, message.text.clone());
    if let Some(mode) = parse_mode(message.format) {
        request = request.parse_mode(mode);
    }
    if let Some(menu) = &message.menu {
        request = request.reply_markup(reply_markup(menu));
    }

    Ok(request.await?)
}

/// Replace the text of a menu message. Omitting an inline keyboard removes
/// the buttons, so a resolved menu cannot be pressed again.
pub async fn edit_outbound(bot: &Bot, target: MessageRef, message: &OutboundMessage) -> Result<()> {
    let mut request = bot.edit_message_text(
        ChatId(target.chat_id),
        MessageId(target.message_id),
        message.text.clone(),
    );
    if let Some(mode) = parse_mode(message.format) {
        request = request.parse_mode(mode);
    }
    if let Some(MenuSpec::Inline(rows)) = &message.menu {
        request = request.reply_markup(inline_keyboard(rows));
    }

    request.await?;
    Ok(())
}

/// Answer a callback query, optionally with a notification
pub async fn answer_callback(
    bot: &Bot,
    q: &teloxide::types::CallbackQuery,
    alert: Option<&Alert>,
) -> Result<()> {
    let mut request = bot.answer_callback_query(q.id.clone());
    if let Some(alert) = alert {
        request = request.text(alert.text.clone()).show_alert(alert.show_alert);
    }

    request.await?;
    Ok(())
}
