use std::fmt;

/// Identifies one conversation (a chat with one user).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a message previously sent or received in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef(pub i32);

/// Opaque handle to an attachment stored by the chat platform.
///
/// The bytes are fetched lazily through [`crate::ChatTransport::download`],
/// so events that end up ignored never cost a download.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef(pub String);

/// An inbound event delivered by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub conversation: ConversationId,
    pub kind: EventKind,
}

impl ChatEvent {
    pub fn new(conversation: ConversationId, kind: EventKind) -> Self {
        Self { conversation, kind }
    }
}

/// Payload of an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A slash command, without the leading `/` and without any `@bot` suffix.
    Command { name: String, args: String },
    /// A compressed photo attachment (always JPEG on the wire).
    Photo(FileRef),
    /// A file attachment with its declared MIME type, if any.
    Document {
        mime_type: Option<String>,
        file: FileRef,
    },
    /// An inline button press. `message` is the message carrying the button.
    ButtonPress {
        key: String,
        message: Option<MessageRef>,
    },
    /// Free text that is not a command.
    Text(String),
    /// A user message the bot cannot use (sticker, voice note, video, ...),
    /// named by its kind.
    Unsupported(String),
}

impl EventKind {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Command { .. } => "command",
            EventKind::Photo(_) => "photo",
            EventKind::Document { .. } => "document",
            EventKind::ButtonPress { .. } => "button",
            EventKind::Text(_) => "text",
            EventKind::Unsupported(_) => "unsupported",
        }
    }

    /// Parses a raw message text into a command or plain text event.
    ///
    /// Handles the `@bot` suffix: `/start@studio_bot now` is the `start`
    /// command with args `now`.
    pub fn from_text(text: &str) -> Self {
        let Some(stripped) = text.strip_prefix('/') else {
            return EventKind::Text(text.to_string());
        };
        let (first, rest) = match stripped.split_once(char::is_whitespace) {
            Some((first, rest)) => (first, rest.trim()),
            None => (stripped, ""),
        };
        let name = first.split('@').next().unwrap_or(first);
        if name.is_empty() {
            return EventKind::Text(text.to_string());
        }
        EventKind::Command {
            name: name.to_lowercase(),
            args: rest.to_string(),
        }
    }
}
