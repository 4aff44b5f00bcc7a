use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Side effects the client asks its front end to perform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// One-shot user-visible failure notice.
    Notification { message: String },
    /// The session was invalidated; the login view should be shown.
    RedirectToLogin,
}

#[derive(Clone)]
pub struct EventBus {
    tx: UnboundedSender<ClientEvent>,
}

impl EventBus {
    pub fn channel() -> (Self, UnboundedReceiver<ClientEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }

    /// A bus nobody listens to. Events are dropped.
    pub fn detached() -> Self {
        Self::channel().0
    }

    pub fn notify(&self, message: impl Into<String>) {
        self.tx
            .send(ClientEvent::Notification {
                message: message.into(),
            })
            .ok();
    }

    pub fn redirect_to_login(&self) {
        self.tx.send(ClientEvent::RedirectToLogin).ok();
    }
}

/// Drain everything queued on the receiver without waiting.
pub fn drain(rx: &mut UnboundedReceiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
