//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error, info};

use crate::events::{self, MessageRef};
use crate::reply::{render, HandlerResult};
use crate::router::{self, Route};

use super::ui_builder::send_outbound;
use super::BotContext;

async fn handle_text_message(bot: &Bot, msg: &Message, ctx: &BotContext) -> Result<()> {
    let event = events::from_message(msg);
    let route = router::route(&event);
    debug!(chat_id = %msg.chat.id, route = ?route, "Routed message");

    match route {
        Route::Reply(result) => {
            send_outbound(bot, msg.chat.id, &render(&result)).await?;
        }
        Route::Status => {
            let report = HandlerResult::Status(ctx.status_report());
            send_outbound(bot, msg.chat.id, &render(&report)).await?;
        }
        Route::OpenOrderMenu => {
            let sent = send_outbound(bot, msg.chat.id, &render(&HandlerResult::OrderMenu)).await?;
            let menu = MessageRef::of(&sent);
            ctx.dispatcher.register_menu(menu, Utc::now()).await;
            info!(chat_id = %msg.chat.id, menu = ?menu, "Order menu shown");
        }
        Route::CancelOrder | Route::SelectService(_) | Route::UnknownSelection(_) => {
            debug!(chat_id = %msg.chat.id, "Button route for a text message, ignoring");
        }
    }

    Ok(())
}

/// Entry point for message updates. Failures are contained here: the user
/// gets a generic apology and the update loop keeps running.
pub async fn message_handler(bot: Bot, msg: Message, ctx: Arc<BotContext>) -> Result<()> {
    ctx.server.record_update();

    if let Err(e) = handle_text_message(&bot, &msg, &ctx).await {
        error!(chat_id = %msg.chat.id, error = ?e, "Failed to handle message");

        let apology = render(&HandlerResult::TechnicalError);
        if let Err(send_err) = send_outbound(&bot, msg.chat.id, &apology).await {
            error!(chat_id = %msg.chat.id, error = %send_err, "Failed to send technical error notice");
        }
    }

    Ok(())
}
