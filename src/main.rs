use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use service_desk_bot::bot::{self, BotContext};
use service_desk_bot::config::{Config, Delivery};
use service_desk_bot::dispatcher::OrderDispatcher;
use service_desk_bot::heartbeat;
use service_desk_bot::reply::DeliveryMode;
use service_desk_bot::server::{self, ServerContext};
use service_desk_bot::submission::SheetsClient;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(config: Config) -> Result<()> {
    let server_ctx = Arc::new(ServerContext::new());

    let submitter = SheetsClient::new(config.submission_url.as_str(), config.submit_timeout)?;
    let mode = match config.delivery {
        Delivery::Webhook { .. } => DeliveryMode::Webhook,
        Delivery::Polling => DeliveryMode::Polling,
    };
    let ctx = Arc::new(BotContext::new(
        OrderDispatcher::new(submitter),
        Arc::clone(&server_ctx),
        mode,
    ));

    let bot = Bot::new(config.bot_token.clone());

    match (config.webhook_url(), config.health_url()) {
        (Some(webhook_url), Some(health_url)) => {
            info!("Starting in webhook mode");
            server::register_webhook(&bot, &webhook_url).await?;

            let heartbeat = heartbeat::spawn_heartbeat(
                health_url,
                config.heartbeat_interval,
                Arc::clone(&server_ctx),
            );
            let served = server::serve(bot, ctx, config.port).await;
            heartbeat.abort();
            served?;
        }
        _ => {
            info!("Starting in polling mode");
            bot::run_polling(bot, ctx).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();
    info!("Starting service desk bot");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    if let Err(e) = run(config).await {
        error!(error = ?e, "Bot stopped with a fatal error");
        return Err(e);
    }

    info!("Bot stopped");
    Ok(())
}
