use super::events::ServerMessage;
use thiserror::Error;
use tokio::sync::mpsc;

/// The receiving end is gone; the message was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("channel closed")]
pub struct ChannelClosed;

/// Outbound handle for one participant's connection.
///
/// `send` is fire-and-forget and must not block: the coordinator calls it
/// while holding the session lock.
pub trait Channel: Send + Sync + 'static {
    fn send(&self, message: &ServerMessage) -> Result<(), ChannelClosed>;

    /// Ask the transport to close the connection. Safe to call twice.
    fn close(&self);
}

/// What the connection writer task should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Message(ServerMessage),
    Close,
}

/// Channel backed by an unbounded queue drained by the socket writer task
#[derive(Debug, Clone)]
pub struct QueueChannel {
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl QueueChannel {
    pub fn new(tx: mpsc::UnboundedSender<Outgoing>) -> Self {
        Self { tx }
    }

    /// Create a channel together with the receiver its writer should drain
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Channel for QueueChannel {
    fn send(&self, message: &ServerMessage) -> Result<(), ChannelClosed> {
        self.tx
            .send(Outgoing::Message(message.clone()))
            .map_err(|_| ChannelClosed)
    }

    fn close(&self) {
        let _ = self.tx.send(Outgoing::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_and_close_are_queued_in_order() {
        let (channel, mut rx) = QueueChannel::pair();

        channel.send(&ServerMessage::Submitted).unwrap();
        channel.close();

        assert_eq!(rx.try_recv().unwrap(), Outgoing::Message(ServerMessage::Submitted));
        assert_eq!(rx.try_recv().unwrap(), Outgoing::Close);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (channel, rx) = QueueChannel::pair();
        drop(rx);

        assert_eq!(channel.send(&ServerMessage::Submitted), Err(ChannelClosed));
        // close on a dead channel is silent
        channel.close();
    }
}
