//! Event dispatch off the receive loop.
//!
//! Each conversation gets a worker task that drains its own queue in
//! arrival order, so events from one user never race while different users
//! are served in parallel. A worker retires as soon as its queue is empty;
//! retiring and enqueueing both happen under the same map lock, so no event
//! is dropped and a retiring worker never overlaps its successor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use photostudio_proto::{ChatEvent, ConversationId};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::conversation::Conversation;

type Workers = Arc<Mutex<HashMap<ConversationId, UnboundedSender<ChatEvent>>>>;

/// Routes inbound events to per-conversation workers.
#[derive(Clone)]
pub struct Dispatcher {
    conversation: Arc<Conversation>,
    workers: Workers,
}

impl Dispatcher {
    pub fn new(conversation: Arc<Conversation>) -> Self {
        Self {
            conversation,
            workers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn conversation(&self) -> &Arc<Conversation> {
        &self.conversation
    }

    /// Queues an event behind any pending events of the same conversation.
    ///
    /// Never waits for handling. Must be called from within a tokio runtime.
    pub fn dispatch(&self, event: ChatEvent) {
        let id = event.conversation;
        let mut workers = lock(&self.workers);

        let event = match workers.get(&id) {
            Some(queue) => match queue.send(event) {
                Ok(()) => return,
                // The worker died without retiring (a handler panicked).
                Err(mpsc::error::SendError(event)) => {
                    warn!(chat = %id, "Replacing dead conversation worker");
                    event
                }
            },
            None => event,
        };

        let (queue, receiver) = mpsc::unbounded_channel();
        if queue.send(event).is_err() {
            return;
        }
        workers.insert(id, queue);
        drop(workers);

        debug!(chat = %id, "Spawning conversation worker");
        tokio::spawn(run_worker(
            self.conversation.clone(),
            self.workers.clone(),
            id,
            receiver,
        ));
    }

    /// Number of conversations with queued or running events.
    pub fn active(&self) -> usize {
        lock(&self.workers).len()
    }

    /// Waits until every queued event has been handled, up to `timeout`.
    ///
    /// Returns `false` if work was still pending when the timeout elapsed.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.active() > 0 {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        true
    }
}

async fn run_worker(
    conversation: Arc<Conversation>,
    workers: Workers,
    id: ConversationId,
    mut receiver: UnboundedReceiver<ChatEvent>,
) {
    loop {
        let event = match receiver.try_recv() {
            Ok(event) => event,
            Err(_) => {
                let mut map = lock(&workers);
                match receiver.try_recv() {
                    Ok(event) => event,
                    Err(_) => {
                        map.remove(&id);
                        debug!(chat = %id, "Conversation worker retired");
                        return;
                    }
                }
            }
        };

        if let Err(e) = conversation.handle(event).await {
            warn!(chat = %id, error = %e, "Event handling failed");
        }
    }
}

fn lock(
    workers: &Mutex<HashMap<ConversationId, UnboundedSender<ChatEvent>>>,
) -> MutexGuard<'_, HashMap<ConversationId, UnboundedSender<ChatEvent>>> {
    workers.lock().unwrap_or_else(PoisonError::into_inner)
}
