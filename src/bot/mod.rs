//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Handles incoming text messages and commands
//! - `callback_handler`: Handles order menu button presses
//! - `ui_builder`: Creates keyboards and delivers rendered replies
//!
//! Both delivery modes (webhook and long polling) end up in the same two
//! handlers.

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::UpdateKind;
use tracing::{debug, error, info};

use crate::dispatcher::OrderDispatcher;
use crate::reply::{DeliveryMode, StatusReport};
use crate::server::ServerContext;
use crate::submission::SheetsClient;

pub mod callback_handler;
pub mod message_handler;
pub mod ui_builder;

pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

/// Shared state handed to every update handler
pub struct BotContext {
    pub dispatcher: OrderDispatcher<SheetsClient>,
    pub server: Arc<ServerContext>,
    pub mode: DeliveryMode,
}

impl BotContext {
    pub fn new(
        dispatcher: OrderDispatcher<SheetsClient>,
        server: Arc<ServerContext>,
        mode: DeliveryMode,
    ) -> Self {
        Self {
            dispatcher,
            server,
            mode,
        }
    }

    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            mode: self.mode,
            uptime: self.server.uptime(),
            updates_received: self.server.updates_received(),
            heartbeats: self.server.heartbeats_ok(),
        }
    }
}

/// Process one pushed update
pub async fn handle_update(bot: Bot, ctx: Arc<BotContext>, update: Update) {
    let outcome = match update.kind {
        UpdateKind::Message(msg) => message_handler(bot, msg, ctx).await,
        UpdateKind::CallbackQuery(q) => callback_handler(bot, q, ctx).await,
        _ => {
            debug!("Ignoring unsupported update kind");
            Ok(())
        }
    };

    if let Err(e) = outcome {
        error!(error = ?e, "Update handler failed");
    }
}

/// Long-poll Telegram until Ctrl-C
pub async fn run_polling(bot: Bot, ctx: Arc<BotContext>) -> Result<()> {
    bot.delete_webhook().drop_pending_updates(true).await?;
    info!("Polling for updates");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
