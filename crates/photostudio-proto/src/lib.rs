//! # photostudio-proto
//!
//! Shared types, error definitions, and traits for the Photostudio bot.
//!
//! This crate provides the vocabulary every other crate speaks:
//! - Inbound chat events and the conversation they belong to
//! - Outbound keyboards and the [`ChatTransport`] sink
//! - Generation requests, typed generation results and the [`ImageGenerator`] seam
//! - The [`ChatAdapter`] trait that platform integrations implement to feed events in

pub mod adapter;
mod event;
mod generation;
mod keyboard;
mod secret;
mod transport;

pub use adapter::{ChatAdapter, EventSink};
pub use event::{ChatEvent, ConversationId, EventKind, FileRef, MessageRef};
pub use generation::{
    GenerationFailure, GenerationRequest, GenerationResult, ImageGenerator, ImagePayload,
    JPEG_MIME, SafetyPolicy,
};
pub use keyboard::{Button, ButtonAction, Keyboard};
pub use secret::mask_secret;
pub use transport::{ChatAction, ChatTransport, TransportError, TransportResult};
