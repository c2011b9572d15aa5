//! # photostudio-core
//!
//! The conversation engine of the Photostudio bot.
//!
//! A user starts a photoshoot, hands over one or two photos, receives a
//! generated portrait and refines it with free-text edits. This crate owns
//! the sequencing of that exchange:
//!
//! - [`Session`] / [`Stage`]: per-conversation data, shaped so that a stage
//!   only carries the data valid in it
//! - [`SessionStore`]: in-memory sessions with per-conversation locking
//! - [`Conversation`]: the state machine turning [`ChatEvent`]s into
//!   transitions, generation calls and outbound messages
//! - [`Dispatcher`]: runs handlers off the receive loop, one queue per
//!   conversation
//! - [`StyleCatalog`]: named styles for the style-menu flow
//! - [`testing`]: recording transport and scripted generator for tests
//!
//! [`ChatEvent`]: photostudio_proto::ChatEvent

mod conversation;
mod dispatcher;
mod error;
pub mod messages;
pub mod prompts;
mod session;
mod store;
mod styles;
pub mod testing;

pub use conversation::{Conversation, ConversationSettings, FlowMode, ParseFlowModeError};
pub use dispatcher::Dispatcher;
pub use error::{StudioError, StudioResult, StyleCatalogError};
pub use session::{Session, SessionState, Stage};
pub use store::{SessionSlot, SessionStore};
pub use styles::{Style, StyleCatalog};
