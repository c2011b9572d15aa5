//! # photostudio-telegram
//!
//! Telegram side of the Photostudio bot.
//!
//! ## Key Components
//!
//! - [`TelegramBot`]: [`photostudio_proto::ChatTransport`] over teloxide (messages,
//!   photos, keyboards, edits, deletes, chat actions and file downloads)
//! - [`TelegramService`]: [`photostudio_proto::ChatAdapter`] that long-polls
//!   `getUpdates` and feeds events to the dispatcher
//! - [`to_event`]: update → [`photostudio_proto::ChatEvent`] translation
//! - [`shutdown_signal`]: Ctrl+C / SIGTERM flag shared with the rest of the process

mod bot;
mod error;
mod service;
mod updates;

pub use bot::{BASE_RETRY_DELAY, MAX_SEND_RETRIES, TelegramBot, reply_markup, retry_with_backoff};
pub use error::{TelegramError, TelegramResult};
pub use service::{
    POLL_TIMEOUT_SECS, ShutdownSignal, TelegramService, shutdown_signal, wait_for_shutdown,
};
pub use updates::to_event;
