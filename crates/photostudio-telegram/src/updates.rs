//! Translation of Telegram updates into [`ChatEvent`]s.

use photostudio_proto::{ChatEvent, ConversationId, EventKind, FileRef, MessageRef};
use teloxide::types::{CallbackQuery, Message, Update, UpdateKind};

/// Converts an update into an event, or `None` for updates the bot ignores
/// (edits, channel posts, service messages, ...).
pub fn to_event(update: &Update) -> Option<ChatEvent> {
    match &update.kind {
        UpdateKind::Message(message) => message_event(message),
        UpdateKind::CallbackQuery(query) => callback_event(query),
        _ => None,
    }
}

fn message_event(message: &Message) -> Option<ChatEvent> {
    let conversation = ConversationId(message.chat.id.0);

    if let Some(photos) = message.photo() {
        // Sizes come smallest first.
        let largest = photos.last()?;
        return Some(ChatEvent::new(
            conversation,
            EventKind::Photo(FileRef(largest.file.id.0.clone())),
        ));
    }

    if let Some(document) = message.document() {
        return Some(ChatEvent::new(
            conversation,
            EventKind::Document {
                mime_type: document.mime_type.as_ref().map(ToString::to_string),
                file: FileRef(document.file.id.0.clone()),
            },
        ));
    }

    if let Some(text) = message.text() {
        return Some(ChatEvent::new(conversation, EventKind::from_text(text)));
    }

    // Service messages (title changes, pins, ...) stay silent.
    let kind = unsupported_kind(message)?;
    Some(ChatEvent::new(
        conversation,
        EventKind::Unsupported(kind.to_string()),
    ))
}

/// Names user-sent content the bot has no use for.
fn unsupported_kind(message: &Message) -> Option<&'static str> {
    let kinds = [
        (message.sticker().is_some(), "sticker"),
        (message.animation().is_some(), "animation"),
        (message.video().is_some(), "video"),
        (message.video_note().is_some(), "video_note"),
        (message.voice().is_some(), "voice"),
        (message.audio().is_some(), "audio"),
        (message.location().is_some(), "location"),
        (message.contact().is_some(), "contact"),
        (message.poll().is_some(), "poll"),
        (message.dice().is_some(), "dice"),
    ];
    kinds
        .into_iter()
        .find_map(|(present, kind)| present.then_some(kind))
}

fn callback_event(query: &CallbackQuery) -> Option<ChatEvent> {
    let key = query.data.clone()?;
    let (conversation, message) = match &query.message {
        Some(message) => (
            ConversationId(message.chat().id.0),
            Some(MessageRef(message.id().0)),
        ),
        // Messages older than 48h are not attached; private chats share the user id.
        None => (ConversationId(query.from.id.0 as i64), None),
    };
    Some(ChatEvent::new(
        conversation,
        EventKind::ButtonPress { key, message },
    ))
}
