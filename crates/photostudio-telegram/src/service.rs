//! Long-polling receive loop.
//!
//! Polls `getUpdates`, acknowledges button presses so the client stops its
//! spinner, and hands every recognised update to the [`EventSink`] without
//! waiting for it to be handled.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use photostudio_proto::{ChatAdapter, EventSink, mask_secret};
use teloxide::payloads::GetUpdatesSetters;
use teloxide::requests::Requester;
use teloxide::types::{AllowedUpdate, BotCommand, UpdateKind};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::bot::TelegramBot;
use crate::error::{TelegramError, TelegramResult};
use crate::updates::to_event;

/// Long-poll timeout passed to `getUpdates`.
pub const POLL_TIMEOUT_SECS: u32 = 30;

/// Pause after a failed poll before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Receives a `true` once Ctrl+C or SIGTERM arrives.
pub type ShutdownSignal = watch::Receiver<bool>;

/// Installs Ctrl+C and SIGTERM handlers and returns the shared shutdown flag.
pub fn shutdown_signal() -> ShutdownSignal {
    let (tx, rx) = watch::channel(false);
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl+C received, shutting down");
                let _ = tx.send(true);
            }
        });
    }
    #[cfg(unix)]
    {
        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    info!("SIGTERM received, shutting down");
                    let _ = tx.send(true);
                }
                Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
            }
        });
    }
    #[cfg(not(unix))]
    drop(tx);
    rx
}

/// Resolves once `shutdown` flips to `true` (or its sender is gone).
pub async fn wait_for_shutdown(mut shutdown: ShutdownSignal) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            // No sender left means nobody can ask for a shutdown; wait forever.
            std::future::pending::<()>().await;
        }
    }
}

/// Telegram implementation of [`ChatAdapter`].
pub struct TelegramService {
    bot: TelegramBot,
    bot_token: String,
    shutdown: ShutdownSignal,
}

impl TelegramService {
    /// Create a new TelegramService.
    ///
    /// The caller resolves the token; a blank one is rejected.
    pub fn new(bot_token: String, shutdown: ShutdownSignal) -> TelegramResult<Self> {
        let bot_token = bot_token.trim().to_string();
        if bot_token.is_empty() {
            return Err(TelegramError::MissingBotToken);
        }

        Ok(Self {
            bot: TelegramBot::new(&bot_token),
            bot_token,
            shutdown,
        })
    }

    /// The outbound side, sharing this service's credentials.
    pub fn bot(&self) -> &TelegramBot {
        &self.bot
    }

    /// The bot token, masked for logging.
    pub fn bot_token_masked(&self) -> String {
        mask_secret(&self.bot_token)
    }

    /// Checks the token and registers the command menu.
    async fn start(&self) -> TelegramResult<()> {
        let me = self
            .bot
            .inner()
            .get_me()
            .await
            .map_err(|e| TelegramError::Startup(e.to_string()))?;
        info!(bot = %me.username(), token = %self.bot_token_masked(), "Telegram bot connected");

        let commands = vec![
            BotCommand::new("start", "Begin a new photoshoot"),
            BotCommand::new("cancel", "Stop and clear your photos"),
            BotCommand::new("help", "How to use the studio"),
        ];
        if let Err(e) = self.bot.inner().set_my_commands(commands).await {
            warn!(error = %e, "Failed to register bot commands");
        }
        Ok(())
    }

    async fn poll(&self, offset: i32) -> TelegramResult<Vec<teloxide::types::Update>> {
        self.bot
            .inner()
            .get_updates()
            .offset(offset)
            .timeout(POLL_TIMEOUT_SECS)
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
            .await
            .map_err(|e| TelegramError::Receive(e.to_string()))
    }
}

impl fmt::Debug for TelegramService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramService")
            .field("bot_token", &self.bot_token_masked())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatAdapter for TelegramService {
    async fn run(&self, sink: EventSink) -> anyhow::Result<()> {
        self.start().await?;

        let mut shutdown = self.shutdown.clone();
        let mut offset: i32 = 0;

        while !*shutdown.borrow_and_update() {
            let polled = tokio::select! {
                polled = self.poll(offset) => polled,
                _ = shutdown.changed() => break,
            };

            let updates = match polled {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "Telegram poll failed, retrying");
                    tokio::select! {
                        () = tokio::time::sleep(POLL_RETRY_DELAY) => {}
                        _ = shutdown.changed() => break,
                    }
                    continue;
                }
            };

            for update in updates {
                #[allow(clippy::cast_possible_wrap)]
                let id = update.id.0 as i32;
                offset = id + 1;

                if let UpdateKind::CallbackQuery(query) = &update.kind {
                    if let Err(e) = self.bot.inner().answer_callback_query(query.id.clone()).await {
                        debug!(error = %e, "Failed to answer callback query");
                    }
                }

                match to_event(&update) {
                    Some(event) => {
                        debug!(chat = %event.conversation, kind = event.kind.label(), "Received update");
                        sink(event);
                    }
                    None => debug!(update_id = id, "Ignoring unsupported update"),
                }
            }
        }

        info!("Telegram polling stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_signal() -> ShutdownSignal {
        watch::channel(false).1
    }

    #[test]
    fn new_trims_token() {
        let service =
            TelegramService::new(" test-token-123\n".to_string(), idle_signal()).unwrap();
        assert_eq!(service.bot_token, "test-token-123");
    }

    #[test]
    fn blank_token_is_missing() {
        let result = TelegramService::new("   ".to_string(), idle_signal());
        assert!(matches!(result, Err(TelegramError::MissingBotToken)));
    }

    #[test]
    fn bot_token_masked_works() {
        let service =
            TelegramService::new("abcd1234efgh5678".to_string(), idle_signal()).unwrap();
        assert_eq!(service.bot_token_masked(), "abcd...5678");
        let rendered = format!("{service:?}");
        assert!(rendered.contains("abcd...5678"));
        assert!(!rendered.contains("abcd1234efgh5678"));
    }

    #[tokio::test]
    async fn wait_for_shutdown_returns_after_signal() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(wait_for_shutdown(rx));
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn wait_for_shutdown_returns_when_already_set() {
        let (_tx, rx) = watch::channel(true);
        tokio::time::timeout(Duration::from_secs(1), wait_for_shutdown(rx))
            .await
            .unwrap();
    }
}
