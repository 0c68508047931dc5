//! # Service Desk Telegram Bot
//!
//! A Telegram bot for a small automation studio: it answers common questions,
//! shows the service menu and forwards orders to a spreadsheet web app.

pub mod bot;
pub mod catalog;
pub mod config;
pub mod dialogue;
pub mod dispatcher;
pub mod events;
pub mod heartbeat;
pub mod localization;
pub mod order;
pub mod reply;
pub mod router;
pub mod server;
pub mod submission;
