use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use photostudio_proto::{
    ChatAction, ChatTransport, ConversationId, FileRef, Keyboard, MessageRef, TransportError,
    TransportResult,
};

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text {
        to: ConversationId,
        message: MessageRef,
        text: String,
        keyboard: Keyboard,
    },
    Photo {
        to: ConversationId,
        message: MessageRef,
        image: Bytes,
        caption: String,
        keyboard: Keyboard,
    },
    Edit {
        to: ConversationId,
        message: MessageRef,
        text: String,
        keyboard: Keyboard,
    },
    Delete {
        to: ConversationId,
        message: MessageRef,
    },
    Action {
        to: ConversationId,
        action: ChatAction,
    },
}

impl Outbound {
    pub fn to(&self) -> ConversationId {
        match self {
            Outbound::Text { to, .. }
            | Outbound::Photo { to, .. }
            | Outbound::Edit { to, .. }
            | Outbound::Delete { to, .. }
            | Outbound::Action { to, .. } => *to,
        }
    }

    /// Text of a sent message or edit, caption of a photo.
    pub fn text(&self) -> Option<&str> {
        match self {
            Outbound::Text { text, .. } | Outbound::Edit { text, .. } => Some(text),
            Outbound::Photo { caption, .. } => Some(caption),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct TransportState {
    sent: Vec<Outbound>,
    files: HashMap<String, Bytes>,
    next_id: i32,
}

/// A transport that records outbound calls instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    state: Arc<Mutex<TransportState>>,
    fail_sends: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose text and photo sends always fail.
    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::default()
        }
    }

    /// Registers an attachment so [`ChatTransport::download`] can serve it.
    pub fn add_file(&self, id: &str, data: impl Into<Bytes>) -> FileRef {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(id.to_string(), data.into());
        FileRef(id.to_string())
    }

    pub fn sent(&self) -> Vec<Outbound> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn sent_to(&self, to: ConversationId) -> Vec<Outbound> {
        self.sent().into_iter().filter(|o| o.to() == to).collect()
    }

    /// Last text message or photo sent to `to` (edits, deletes and actions skipped).
    pub fn last_message(&self, to: ConversationId) -> Option<Outbound> {
        self.sent_to(to)
            .into_iter()
            .rev()
            .find(|o| matches!(o, Outbound::Text { .. } | Outbound::Photo { .. }))
    }

    pub fn photos(&self, to: ConversationId) -> Vec<Bytes> {
        self.sent_to(to)
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Photo { image, .. } => Some(image),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().sent.clear();
    }

    fn record(&self, make: impl FnOnce(MessageRef) -> Outbound) -> MessageRef {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = MessageRef(state.next_id);
        state.sent.push(make(id));
        id
    }

    fn check(&self) -> TransportResult<()> {
        if self.fail_sends {
            return Err(TransportError::Send("mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(
        &self,
        to: ConversationId,
        text: &str,
        keyboard: Keyboard,
    ) -> TransportResult<MessageRef> {
        self.check()?;
        Ok(self.record(|message| Outbound::Text {
            to,
            message,
            text: text.to_string(),
            keyboard,
        }))
    }

    async fn send_photo(
        &self,
        to: ConversationId,
        image: Bytes,
        caption: &str,
        keyboard: Keyboard,
    ) -> TransportResult<MessageRef> {
        self.check()?;
        Ok(self.record(|message| Outbound::Photo {
            to,
            message,
            image,
            caption: caption.to_string(),
            keyboard,
        }))
    }

    async fn edit_text(
        &self,
        to: ConversationId,
        message: MessageRef,
        text: &str,
        keyboard: Keyboard,
    ) -> TransportResult<()> {
        self.check()?;
        self.state.lock().unwrap().sent.push(Outbound::Edit {
            to,
            message,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn delete(&self, to: ConversationId, message: MessageRef) -> TransportResult<()> {
        self.state
            .lock()
            .unwrap()
            .sent
            .push(Outbound::Delete { to, message });
        Ok(())
    }

    async fn send_action(&self, to: ConversationId, action: ChatAction) -> TransportResult<()> {
        self.state
            .lock()
            .unwrap()
            .sent
            .push(Outbound::Action { to, action });
        Ok(())
    }

    async fn download(&self, file: &FileRef) -> TransportResult<Bytes> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(&file.0)
            .cloned()
            .ok_or_else(|| TransportError::Download(format!("unknown file {}", file.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sends_with_increasing_ids() {
        let transport = RecordingTransport::new();
        let first = transport
            .send_text(ConversationId(1), "a", Keyboard::None)
            .await
            .unwrap();
        let second = transport
            .send_photo(ConversationId(1), Bytes::from_static(b"x"), "b", Keyboard::None)
            .await
            .unwrap();
        assert_eq!(first, MessageRef(1));
        assert_eq!(second, MessageRef(2));
        assert_eq!(transport.sent().len(), 2);
        assert_eq!(transport.photos(ConversationId(1)), vec![Bytes::from_static(b"x")]);
    }

    #[tokio::test]
    async fn serves_registered_files_only() {
        let transport = RecordingTransport::new();
        let file = transport.add_file("f1", vec![1u8, 2]);
        assert_eq!(transport.download(&file).await.unwrap().as_ref(), &[1u8, 2]);
        let missing = transport.download(&FileRef("nope".to_string())).await;
        assert!(matches!(missing, Err(TransportError::Download(_))));
    }

    #[tokio::test]
    async fn failing_transport_rejects_sends() {
        let transport = RecordingTransport::failing();
        let result = transport
            .send_text(ConversationId(1), "a", Keyboard::None)
            .await;
        assert!(matches!(result, Err(TransportError::Send(_))));
        assert!(transport.sent().is_empty());
    }
}
