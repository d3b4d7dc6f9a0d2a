//! Socket handler trait for the connection's frame consumer.

use async_trait::async_trait;

/// Callbacks invoked by the connection task owned by
/// [`ConnectionManager`](crate::ConnectionManager).
///
/// Handlers for one frame run to completion before the next frame is
/// read, so implementations see frames in arrival order without
/// interleaving.
#[async_trait]
pub trait SocketHandler: Send + Sync + 'static {
    /// Called for each text frame received from the socket.
    async fn on_frame(&self, frame: &str);

    /// Called when the connection reaches Open, including after a reconnect.
    async fn on_open(&self) {}

    /// Called when the connection is lost, before a reconnect is scheduled.
    async fn on_disconnect(&self) {}
}
