//! Ordering and concurrency of the per-conversation dispatcher.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use photostudio_core::testing::{RecordingTransport, ScriptedGenerator};
use photostudio_core::{
    Conversation, ConversationSettings, Dispatcher, SessionState, SessionStore,
};
use photostudio_proto::{ChatEvent, ConversationId, EventKind, ImagePayload};

fn dispatcher(transport: &RecordingTransport, generator: &ScriptedGenerator) -> Dispatcher {
    let conversation = Conversation::new(
        Arc::new(transport.clone()),
        Arc::new(generator.clone()),
        Arc::new(SessionStore::new()),
        ConversationSettings::default(),
    );
    Dispatcher::new(Arc::new(conversation))
}

fn start(chat: ConversationId) -> ChatEvent {
    ChatEvent::new(
        chat,
        EventKind::Command {
            name: "start".to_string(),
            args: String::new(),
        },
    )
}

fn photo(transport: &RecordingTransport, chat: ConversationId, id: &str) -> ChatEvent {
    let file = transport.add_file(id, Bytes::from(id.to_string()));
    ChatEvent::new(chat, EventKind::Photo(file))
}

fn image(data: &'static [u8]) -> ImagePayload {
    ImagePayload::new("image/png", Bytes::from_static(data))
}

#[tokio::test]
async fn events_of_one_conversation_are_handled_in_order() {
    let transport = RecordingTransport::new();
    let generator = ScriptedGenerator::new(vec![Ok(image(b"result"))])
        .with_delay(Duration::from_millis(50));
    let dispatcher = dispatcher(&transport, &generator);
    let chat = ConversationId(1);

    // Queued back to back: the edit must observe the finished creation.
    dispatcher.dispatch(start(chat));
    dispatcher.dispatch(photo(&transport, chat, "face"));
    dispatcher.dispatch(photo(&transport, chat, "look"));
    dispatcher.dispatch(ChatEvent::new(chat, EventKind::Text("brighter".to_string())));

    assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);

    let requests = generator.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].images[0].data.as_ref(), b"face");
    assert_eq!(requests[0].images[1].data.as_ref(), b"look");
    assert_eq!(requests[1].images[0].data.as_ref(), b"result");

    // The scripted edit failed, so the first result is kept.
    let store = dispatcher.conversation().store();
    let session = store.snapshot(chat).await.unwrap();
    assert_eq!(session.state(), SessionState::Editing);
    assert_eq!(session.current_image().unwrap().data.as_ref(), b"result");
}

#[tokio::test]
async fn conversations_are_served_in_parallel() {
    let transport = RecordingTransport::new();
    let generator = ScriptedGenerator::new(vec![Ok(image(b"a")), Ok(image(b"b"))])
        .with_delay(Duration::from_millis(300));
    let dispatcher = dispatcher(&transport, &generator);
    let (alice, bob) = (ConversationId(10), ConversationId(20));

    for chat in [alice, bob] {
        dispatcher.dispatch(start(chat));
        dispatcher.dispatch(photo(&transport, chat, &format!("face-{chat}")));
    }
    assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);

    let began = Instant::now();
    dispatcher.dispatch(photo(&transport, alice, "look-a"));
    dispatcher.dispatch(photo(&transport, bob, "look-b"));
    assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);

    // Two sequential generations would take at least 600ms.
    assert!(began.elapsed() < Duration::from_millis(550));
    assert_eq!(generator.call_count(), 2);

    let store = dispatcher.conversation().store();
    assert_eq!(store.state(alice).await, SessionState::Editing);
    assert_eq!(store.state(bob).await, SessionState::Editing);
    assert_eq!(transport.photos(alice).len(), 1);
    assert_eq!(transport.photos(bob).len(), 1);
}

#[tokio::test]
async fn workers_retire_when_queues_drain() {
    let transport = RecordingTransport::new();
    let generator = ScriptedGenerator::default();
    let dispatcher = dispatcher(&transport, &generator);

    for id in 0..5 {
        dispatcher.dispatch(start(ConversationId(id)));
    }
    assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);
    assert_eq!(dispatcher.active(), 0);

    // A retired conversation gets a fresh worker on its next event.
    dispatcher.dispatch(photo(&transport, ConversationId(3), "face"));
    assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);
    assert_eq!(
        dispatcher.conversation().store().state(ConversationId(3)).await,
        SessionState::AwaitingStyleReference
    );
}

#[tokio::test]
async fn wait_idle_times_out_on_slow_work() {
    let transport = RecordingTransport::new();
    let generator = ScriptedGenerator::new(vec![Ok(image(b"slow"))])
        .with_delay(Duration::from_millis(500));
    let dispatcher = dispatcher(&transport, &generator);
    let chat = ConversationId(5);

    dispatcher.dispatch(start(chat));
    dispatcher.dispatch(photo(&transport, chat, "face"));
    dispatcher.dispatch(photo(&transport, chat, "look"));

    assert!(!dispatcher.wait_idle(Duration::from_millis(50)).await);
    assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);
}
