use std::{borrow::Cow, convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::api::rest::dto::NotificationDto;
use crate::bot::reply;
use crate::contract::model::Identity;
use crate::domain::events::AccessEvent;
use crate::domain::ports::EventPublisher;

/// Small typed SSE broadcaster built on `tokio::sync::broadcast`.
/// Bounded channel: subscribers that lag lose the oldest messages.
#[derive(Clone)]
pub struct SseBroadcaster<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> SseBroadcaster<T> {
    /// Create a broadcaster with bounded buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Broadcast a single message to current subscribers.
    /// Having no subscribers is not an error.
    pub fn send(&self, value: T) {
        let _ = self.tx.send(value);
    }

    /// Subscribe to a typed stream of messages; lag/drop errors are filtered out.
    pub fn subscribe_stream(&self) -> impl Stream<Item = T> {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|res| async move { res.ok() })
    }

    /// SSE response with JSON payloads and a constant `event:` name, with
    /// periodic keepalive pings.
    pub fn sse_named<S>(
        stream: S,
        event_name: impl Into<Cow<'static, str>>,
    ) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
    where
        S: Stream<Item = T> + Send + 'static,
        T: Serialize,
    {
        let event_name = event_name.into();
        let events = stream.map(move |msg| {
            let ev = Event::default()
                .event(&event_name)
                .json_data(&msg)
                .unwrap_or_else(|_| {
                    Event::default()
                        .event(&event_name)
                        .data("serialization_error")
                });
            Ok(ev)
        });
        Sse::new(events).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("keepalive"),
        )
    }
}

/// Adapter: implements the domain port and forwards rendered chat
/// notifications into the SSE broadcaster.
pub struct SseNotificationPublisher {
    out: SseBroadcaster<NotificationDto>,
    admin: Identity,
}

impl SseNotificationPublisher {
    pub fn new(out: SseBroadcaster<NotificationDto>, admin: Identity) -> Self {
        Self { out, admin }
    }
}

impl EventPublisher<AccessEvent> for SseNotificationPublisher {
    fn publish(&self, event: &AccessEvent) {
        let message = reply::notification(event, self.admin);
        self.out.send(NotificationDto::new(event, &message));
    }
}
