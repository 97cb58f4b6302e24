//! Outbound channel seam.
//!
//! The engine publishes into a room through [`Channel`]. Delivery is best
//! effort: a publish never blocks and never fails the operation that caused
//! it, so the result is a [`SendOutcome`] rather than a `Result`.

use faceoff_protocol::ChannelEvent;
use tokio::sync::mpsc;

/// Whether an event left this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Failed(String),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Fire-and-forget publishing into the match room.
pub trait Channel: Send + 'static {
    fn publish(&self, event: ChannelEvent) -> SendOutcome;
}

/// An in-process channel. Every published event lands on the paired
/// receiver, which makes it the natural stand-in for a room in tests and
/// for embedding the engine next to its renderer.
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    tx: mpsc::UnboundedSender<ChannelEvent>,
}

impl MemoryChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Channel for MemoryChannel {
    fn publish(&self, event: ChannelEvent) -> SendOutcome {
        match self.tx.send(event) {
            Ok(()) => SendOutcome::Sent,
            Err(_) => SendOutcome::Failed("receiver dropped".into()),
        }
    }
}
