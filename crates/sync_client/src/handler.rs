//! Socket handler feeding inbound frames into the event router.

use async_trait::async_trait;
use common::SocketHandler;
use protocol::EventRouter;
use std::sync::Arc;
use tracing::info;

/// Bridges the connection task to the router: every text frame is
/// decoded and dispatched, malformed frames are absorbed by the router.
pub struct RouterHandler {
    router: Arc<EventRouter>,
}

impl RouterHandler {
    pub fn new(router: Arc<EventRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl SocketHandler for RouterHandler {
    async fn on_frame(&self, frame: &str) {
        self.router.route(frame);
    }

    async fn on_open(&self) {
        info!("Realtime connection established");
    }

    async fn on_disconnect(&self) {
        info!("Realtime connection lost; reconnect scheduled");
    }
}
