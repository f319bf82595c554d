//! Telegram bot that turns free-text Russian messages into reminders.

pub mod analyzer;
pub mod bot;
pub mod config;
pub mod extractor;
pub mod llm;
pub mod message;
pub mod reply;
pub mod sink;
