use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use photostudio_proto::{
    Button, ButtonAction, ChatAction, ChatTransport, ConversationId, FileRef, Keyboard,
    MessageRef, TransportResult,
};
use teloxide::RequestError;
use teloxide::net::Download;
use teloxide::payloads::{EditMessageTextSetters, SendMessageSetters, SendPhotoSetters};
use teloxide::requests::{Request, Requester};
use teloxide::types::{
    ChatId, FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton,
    KeyboardMarkup, MessageId, ReplyMarkup, WebAppInfo,
};
use tracing::{debug, warn};

use crate::error::{TelegramError, TelegramResult};

/// Maximum attempts for a single outbound call.
pub const MAX_SEND_RETRIES: u32 = 3;

/// Delay before the first retry; doubles on every further attempt.
pub const BASE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Wraps a `teloxide::Bot` and implements [`ChatTransport`] for it.
#[derive(Clone)]
pub struct TelegramBot {
    bot: teloxide::Bot,
}

impl TelegramBot {
    /// Create a new TelegramBot from a bot token.
    pub fn new(token: &str) -> Self {
        Self {
            bot: teloxide::Bot::new(token),
        }
    }

    /// The underlying teloxide client.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

/// Runs `op` until it succeeds, retrying network failures with exponential backoff.
///
/// API errors (bad request, blocked by user, ...) fail immediately.
pub async fn retry_with_backoff<T, F, Fut>(what: &str, mut op: F) -> TelegramResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RequestError>>,
{
    let mut delay = BASE_RETRY_DELAY;
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e @ (RequestError::Network(_) | RequestError::Io(_)))
                if attempt < MAX_SEND_RETRIES =>
            {
                warn!(attempt, error = %e, "Telegram {what} failed, retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => {
                return Err(TelegramError::Send {
                    attempts: attempt,
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Converts a keyboard into Telegram reply markup. `None` leaves the client as is.
pub fn reply_markup(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::None => None,
        Keyboard::Inline(rows) => Some(ReplyMarkup::InlineKeyboard(inline_markup(rows))),
        Keyboard::Reply(rows) => {
            let rows: Vec<Vec<KeyboardButton>> = rows
                .iter()
                .map(|row| row.iter().map(KeyboardButton::new).collect())
                .collect();
            Some(ReplyMarkup::Keyboard(KeyboardMarkup::new(rows).resize_keyboard()))
        }
    }
}

/// Inline markup for message edits, which cannot carry reply keyboards.
fn edit_markup(keyboard: &Keyboard) -> Option<InlineKeyboardMarkup> {
    match keyboard {
        Keyboard::Inline(rows) => Some(inline_markup(rows)),
        _ => None,
    }
}

fn inline_markup(rows: &[Vec<Button>]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = rows
        .iter()
        .map(|row| row.iter().filter_map(inline_button).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();
    InlineKeyboardMarkup::new(rows)
}

fn inline_button(button: &Button) -> Option<InlineKeyboardButton> {
    match &button.action {
        ButtonAction::Callback(key) => {
            Some(InlineKeyboardButton::callback(button.label.as_str(), key.as_str()))
        }
        ButtonAction::WebApp(url) => match reqwest::Url::parse(url) {
            Ok(url) => Some(InlineKeyboardButton::web_app(
                button.label.as_str(),
                WebAppInfo { url },
            )),
            Err(e) => {
                warn!(url = %url, error = %e, "Dropping web app button with invalid URL");
                None
            }
        },
    }
}

fn chat(to: ConversationId) -> ChatId {
    ChatId(to.0)
}

#[async_trait]
impl ChatTransport for TelegramBot {
    async fn send_text(
        &self,
        to: ConversationId,
        text: &str,
        keyboard: Keyboard,
    ) -> TransportResult<MessageRef> {
        let markup = reply_markup(&keyboard);
        let message = retry_with_backoff("send_message", || {
            let mut request = self.bot.send_message(chat(to), text);
            if let Some(markup) = &markup {
                request = request.reply_markup(markup.clone());
            }
            request.send()
        })
        .await?;
        Ok(MessageRef(message.id.0))
    }

    async fn send_photo(
        &self,
        to: ConversationId,
        image: Bytes,
        caption: &str,
        keyboard: Keyboard,
    ) -> TransportResult<MessageRef> {
        let markup = reply_markup(&keyboard);
        let message = retry_with_backoff("send_photo", || {
            let mut request = self
                .bot
                .send_photo(chat(to), InputFile::memory(image.to_vec()))
                .caption(caption);
            if let Some(markup) = &markup {
                request = request.reply_markup(markup.clone());
            }
            request.send()
        })
        .await?;
        Ok(MessageRef(message.id.0))
    }

    async fn edit_text(
        &self,
        to: ConversationId,
        message: MessageRef,
        text: &str,
        keyboard: Keyboard,
    ) -> TransportResult<()> {
        let markup = edit_markup(&keyboard);
        retry_with_backoff("edit_message_text", || {
            let mut request = self
                .bot
                .edit_message_text(chat(to), MessageId(message.0), text);
            if let Some(markup) = &markup {
                request = request.reply_markup(markup.clone());
            }
            request.send()
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, to: ConversationId, message: MessageRef) -> TransportResult<()> {
        retry_with_backoff("delete_message", || {
            self.bot.delete_message(chat(to), MessageId(message.0)).send()
        })
        .await?;
        Ok(())
    }

    async fn send_action(&self, to: ConversationId, action: ChatAction) -> TransportResult<()> {
        let action = match action {
            ChatAction::Typing => teloxide::types::ChatAction::Typing,
            ChatAction::UploadPhoto => teloxide::types::ChatAction::UploadPhoto,
        };
        // Purely cosmetic, one attempt is enough.
        self.bot
            .send_chat_action(chat(to), action)
            .await
            .map_err(|e| TelegramError::Send {
                attempts: 1,
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn download(&self, file: &FileRef) -> TransportResult<Bytes> {
        let remote = self
            .bot
            .get_file(FileId(file.0.clone()))
            .await
            .map_err(|e| TelegramError::Download(e.to_string()))?;

        let mut data = Vec::new();
        self.bot
            .download_file(&remote.path, &mut data)
            .await
            .map_err(|e| TelegramError::Download(e.to_string()))?;

        debug!(file = %file.0, bytes = data.len(), "Downloaded attachment");
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn no_keyboard_means_no_markup() {
        assert!(reply_markup(&Keyboard::None).is_none());
    }

    #[test]
    fn inline_keyboard_keeps_rows_and_callback_data() {
        let keyboard = Keyboard::Inline(vec![
            vec![Button::callback("A", "a"), Button::callback("B", "b")],
            vec![Button::callback("Cancel", "cancel_action")],
        ]);
        let Some(ReplyMarkup::InlineKeyboard(markup)) = reply_markup(&keyboard) else {
            panic!("expected inline markup");
        };
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "Cancel");
        assert!(matches!(
            &markup.inline_keyboard[1][0].kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == "cancel_action"
        ));
    }

    #[test]
    fn web_app_button_carries_url() {
        let keyboard = Keyboard::inline_row(vec![Button::web_app(
            "Open",
            "https://studio.example/app",
        )]);
        let Some(ReplyMarkup::InlineKeyboard(markup)) = reply_markup(&keyboard) else {
            panic!("expected inline markup");
        };
        assert!(matches!(
            &markup.inline_keyboard[0][0].kind,
            InlineKeyboardButtonKind::WebApp(info) if info.url.as_str() == "https://studio.example/app"
        ));
    }

    #[test]
    fn invalid_web_app_url_drops_the_button_and_empty_row() {
        let keyboard = Keyboard::Inline(vec![
            vec![Button::web_app("Open", "not a url")],
            vec![Button::callback("Chat", "start_chat_flow")],
        ]);
        let Some(ReplyMarkup::InlineKeyboard(markup)) = reply_markup(&keyboard) else {
            panic!("expected inline markup");
        };
        assert_eq!(markup.inline_keyboard.len(), 1);
        assert_eq!(markup.inline_keyboard[0][0].text, "Chat");
    }

    #[test]
    fn reply_keyboard_is_resized() {
        let keyboard = Keyboard::Reply(vec![vec!["🚀 Start photoshoot".to_string()]]);
        let Some(ReplyMarkup::Keyboard(markup)) = reply_markup(&keyboard) else {
            panic!("expected reply keyboard");
        };
        assert!(markup.resize_keyboard);
        assert_eq!(markup.keyboard[0][0].text, "🚀 Start photoshoot");
    }

    #[test]
    fn edits_only_carry_inline_keyboards() {
        assert!(edit_markup(&Keyboard::Reply(vec![vec!["x".to_string()]])).is_none());
        assert!(edit_markup(&Keyboard::inline_row(vec![Button::callback("x", "y")])).is_some());
    }

    #[tokio::test]
    async fn api_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: TelegramResult<()> = retry_with_backoff("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(RequestError::Api(teloxide::ApiError::BotBlocked))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(TelegramError::Send { attempts: 1, .. })));
    }

    #[tokio::test]
    async fn success_returns_immediately() {
        let result = retry_with_backoff("test", || async { Ok::<_, RequestError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
