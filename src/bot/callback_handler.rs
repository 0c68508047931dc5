//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{debug, error, warn};

use crate::events::{self, InboundEvent, MessageRef};
use crate::reply::{render_callback, Alert, CallbackReply, HandlerResult, OutboundMessage};
use crate::router::{self, Route};

use super::ui_builder::{answer_callback, edit_outbound, send_outbound};
use super::BotContext;

/// Where the answer to a button press is delivered
pub trait CallbackSurface: Send + Sync {
    /// Answer the callback query, optionally with a notification
    fn answer(&self, alert: Option<&Alert>) -> impl Future<Output = Result<()>> + Send;

    /// Replace the menu message in place
    fn edit(&self, replacement: &OutboundMessage) -> impl Future<Output = Result<()>> + Send;

    /// Post the replacement as a new message in the menu's chat
    fn send(&self, replacement: &OutboundMessage) -> impl Future<Output = Result<()>> + Send;
}

/// A button press on a Telegram menu message
struct TelegramCallback<'a> {
    bot: &'a Bot,
    query: &'a CallbackQuery,
    menu: MessageRef,
}

impl CallbackSurface for TelegramCallback<'_> {
    async fn answer(&self, alert: Option<&Alert>) -> Result<()> {
        answer_callback(self.bot, self.query, alert).await
    }

    async fn edit(&self, replacement: &OutboundMessage) -> Result<()> {
        edit_outbound(self.bot, self.menu, replacement).await
    }

    async fn send(&self, replacement: &OutboundMessage) -> Result<()> {
        send_outbound(self.bot, ChatId(self.menu.chat_id), replacement).await?;
        Ok(())
    }
}

/// Deliver a button outcome. The query answer is best effort: it can expire
/// while a submission is running, and the outcome message must still reach
/// the user. When the menu cannot be edited the outcome is sent as a new message.
pub async fn deliver_callback_reply<S: CallbackSurface>(
    surface: &S,
    reply: Option<&CallbackReply>,
) -> Result<()> {
    if let Err(e) = surface.answer(reply.and_then(|r| r.alert.as_ref())).await {
        warn!(error = %e, "Could not answer callback query");
    }

    let Some(replacement) = reply.and_then(|r| r.replacement.as_ref()) else {
        return Ok(());
    };

    if let Err(e) = surface.edit(replacement).await {
        warn!(error = %e, "Could not edit menu message, sending outcome separately");
        surface.send(replacement).await?;
    }

    Ok(())
}

async fn handle_order_action(bot: &Bot, q: &CallbackQuery, ctx: &BotContext) -> Result<()> {
    let Some(event) = events::from_callback(q) else {
        debug!(user_id = %q.from.id, "Callback without data or origin message");
        answer_callback(bot, q, None).await?;
        return Ok(());
    };

    let route = router::route(&event);
    let InboundEvent::CallbackAction {
        sender,
        origin_message,
        ..
    } = event
    else {
        return Ok(());
    };

    let result = match route {
        Route::CancelOrder => ctx.dispatcher.cancel(origin_message, Utc::now()).await,
        Route::SelectService(entry) => {
            ctx.dispatcher
                .select(entry, &sender, origin_message, Utc::now())
                .await
        }
        Route::UnknownSelection(action_id) => {
            warn!(user_id = sender.id, action_id = %action_id, "Selected service not in catalog");
            Some(HandlerResult::ServiceNotFound)
        }
        other => {
            debug!(user_id = sender.id, route = ?other, "Non-button route for callback, ignoring");
            None
        }
    };

    // No result: a repeated press on a menu that is already resolved
    let reply = result.as_ref().map(render_callback);
    let surface = TelegramCallback {
        bot,
        query: q,
        menu: origin_message,
    };
    deliver_callback_reply(&surface, reply.as_ref()).await
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, ctx: Arc<BotContext>) -> Result<()> {
    ctx.server.record_update();
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    if let Err(e) = handle_order_action(&bot, &q, &ctx).await {
        error!(user_id = %q.from.id, error = ?e, "Failed to handle callback query");

        let reply = render_callback(&HandlerResult::TechnicalError);
        if let Err(answer_err) = answer_callback(&bot, &q, reply.alert.as_ref()).await {
            debug!(user_id = %q.from.id, error = %answer_err, "Could not answer failed callback");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    /// Records delivery steps and fails the ones it is told to
    #[derive(Default)]
    struct RecordingSurface {
        fail_answer: bool,
        fail_edit: bool,
        steps: Mutex<Vec<String>>,
    }

    impl RecordingSurface {
        fn steps(&self) -> Vec<String> {
            self.steps.lock().unwrap().clone()
        }

        fn record(&self, step: &str, fail: bool) -> Result<()> {
            self.steps.lock().unwrap().push(step.to_string());
            if fail {
                Err(anyhow!("{step} failed"))
            } else {
                Ok(())
            }
        }
    }

    impl CallbackSurface for RecordingSurface {
        async fn answer(&self, alert: Option<&Alert>) -> Result<()> {
            let step = if alert.is_some() { "answer+alert" } else { "answer" };
            self.record(step, self.fail_answer)
        }

        async fn edit(&self, _replacement: &OutboundMessage) -> Result<()> {
            self.record("edit", self.fail_edit)
        }

        async fn send(&self, _replacement: &OutboundMessage) -> Result<()> {
            self.record("send", false)
        }
    }

    #[tokio::test]
    async fn test_outcome_answers_then_edits() {
        let surface = RecordingSurface::default();
        let reply = render_callback(&HandlerResult::OrderTimedOut);

        deliver_callback_reply(&surface, Some(&reply)).await.unwrap();

        assert_eq!(surface.steps(), vec!["answer+alert", "edit"]);
    }

    #[tokio::test]
    async fn test_expired_query_still_edits_menu() {
        let surface = RecordingSurface {
            fail_answer: true,
            ..Default::default()
        };
        let reply = render_callback(&HandlerResult::OrderTimedOut);

        deliver_callback_reply(&surface, Some(&reply)).await.unwrap();

        assert_eq!(surface.steps(), vec!["answer+alert", "edit"]);
    }

    #[tokio::test]
    async fn test_failed_edit_sends_new_message() {
        let surface = RecordingSurface {
            fail_answer: true,
            fail_edit: true,
            ..Default::default()
        };
        let reply = render_callback(&HandlerResult::OrderRejected {
            reason_summary: "HTTP 500".to_string(),
        });

        deliver_callback_reply(&surface, Some(&reply)).await.unwrap();

        assert_eq!(surface.steps(), vec!["answer+alert", "edit", "send"]);
    }

    #[tokio::test]
    async fn test_alert_only_outcome_never_edits() {
        let surface = RecordingSurface::default();
        let reply = render_callback(&HandlerResult::ServiceNotFound);

        deliver_callback_reply(&surface, Some(&reply)).await.unwrap();

        assert_eq!(surface.steps(), vec!["answer+alert"]);
    }

    /// Repeated presses on a resolved menu only dismiss the spinner
    #[tokio::test]
    async fn test_resolved_menu_answers_silently() {
        let surface = RecordingSurface::default();

        deliver_callback_reply(&surface, None).await.unwrap();

        assert_eq!(surface.steps(), vec!["answer"]);
    }
}
