pub mod launcher;

pub use launcher::DownloadLauncher;

/// Output port: publish domain events (no knowledge of transport).
pub trait EventPublisher<E>: Send + Sync + 'static {
    fn publish(&self, event: &E);
}

/// Publisher that drops every event. Useful where nobody listens.
pub struct NoopPublisher;

impl<E> EventPublisher<E> for NoopPublisher {
    fn publish(&self, _event: &E) {}
}
