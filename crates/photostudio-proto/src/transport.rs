use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::event::{ConversationId, FileRef, MessageRef};
use crate::keyboard::Keyboard;

/// Result type alias for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors surfaced by a chat transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Sending, editing or deleting a message failed.
    #[error("failed to deliver message: {0}")]
    Send(String),

    /// Fetching an attachment failed.
    #[error("failed to download attachment: {0}")]
    Download(String),
}

/// Transient activity indicator shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    UploadPhoto,
}

/// Outbound side of the chat platform.
///
/// Production code uses the Telegram implementation; tests use
/// `photostudio_core::testing::RecordingTransport`.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a text message. Returns a reference usable for edits and deletes.
    async fn send_text(
        &self,
        to: ConversationId,
        text: &str,
        keyboard: Keyboard,
    ) -> TransportResult<MessageRef>;

    /// Send a photo with a caption.
    async fn send_photo(
        &self,
        to: ConversationId,
        image: Bytes,
        caption: &str,
        keyboard: Keyboard,
    ) -> TransportResult<MessageRef>;

    /// Replace the text of a previously sent message.
    async fn edit_text(
        &self,
        to: ConversationId,
        message: MessageRef,
        text: &str,
        keyboard: Keyboard,
    ) -> TransportResult<()>;

    /// Delete a message.
    async fn delete(&self, to: ConversationId, message: MessageRef) -> TransportResult<()>;

    /// Show a transient activity indicator.
    async fn send_action(&self, to: ConversationId, action: ChatAction) -> TransportResult<()>;

    /// Fetch the bytes behind an attachment handle.
    async fn download(&self, file: &FileRef) -> TransportResult<Bytes>;
}
