//! Chat adapter abstractions.
//!
//! Defines the [`ChatAdapter`] trait that chat platform integrations
//! (Telegram today) implement. The binary creates the adapter and passes an
//! [`EventSink`] callback; the adapter calls it for every inbound event and
//! never waits for the conversation to handle it.

use async_trait::async_trait;

use crate::event::ChatEvent;

/// Callback the adapter calls to hand over an inbound event.
///
/// The callback must return immediately; handling happens elsewhere.
pub type EventSink = Box<dyn Fn(ChatEvent) + Send + Sync>;

/// A chat platform integration that produces inbound events.
///
/// Implementors handle all platform-specific concerns: authentication,
/// polling, acknowledging button presses, and translating platform updates
/// into [`ChatEvent`]s.
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Run the receive loop. Returns on shutdown (Ctrl+C / SIGTERM).
    async fn run(&self, sink: EventSink) -> anyhow::Result<()>;
}
