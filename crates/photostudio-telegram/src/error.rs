use photostudio_proto::TransportError;
use thiserror::Error;

/// Result type alias for telegram operations.
pub type TelegramResult<T> = std::result::Result<T, TelegramError>;

/// Errors that can occur during Telegram bot operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// The bot token handed to the service is blank.
    #[error("telegram bot token is empty")]
    MissingBotToken,

    /// Failed to start the Telegram bot (network, auth, etc.).
    #[error("failed to start telegram bot: {0}")]
    Startup(String),

    /// Failed to send a message after retries.
    #[error("failed to send telegram message after {attempts} attempts: {reason}")]
    Send { attempts: u32, reason: String },

    /// Failed to receive updates.
    #[error("failed to receive telegram updates: {0}")]
    Receive(String),

    /// Failed to fetch an attachment.
    #[error("failed to download telegram file: {0}")]
    Download(String),
}

impl From<TelegramError> for TransportError {
    fn from(error: TelegramError) -> Self {
        match error {
            TelegramError::Download(reason) => TransportError::Download(reason),
            other => TransportError::Send(other.to_string()),
        }
    }
}
