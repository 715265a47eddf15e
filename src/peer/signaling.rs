//! In-process signaling channel between two paired peers.
//!
//! Each peer owns a [`PeerInbox`]; its partner holds the matching
//! [`PeerLink`]. Requests that expect an outcome carry a oneshot reply, so the
//! sender's future resolves with the receiver's typed result.

use crate::errors::PeerError;
use crate::types::{IceCandidate, SessionDescription};
use tokio::sync::{mpsc, oneshot};

pub(crate) type Reply = oneshot::Sender<Result<(), PeerError>>;

#[derive(Debug)]
pub(crate) enum SignalMessage {
    RemoteDescription {
        description: SessionDescription,
        reply: Reply,
    },
    CreateAnswer {
        reply: Reply,
    },
    RemoteCandidate(IceCandidate),
}

/// Create a link/inbox pair. The link goes to the partner peer.
pub fn signaling_channel() -> (PeerLink, PeerInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PeerLink { tx }, PeerInbox { rx })
}

/// Sending side: how a peer reaches its paired peer.
#[derive(Debug, Clone)]
pub struct PeerLink {
    tx: mpsc::UnboundedSender<SignalMessage>,
}

impl PeerLink {
    /// Hand `description` to the paired peer as its remote description and
    /// wait until it has been applied.
    pub async fn forward_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), PeerError> {
        let (reply, outcome) = oneshot::channel();
        self.send(SignalMessage::RemoteDescription { description, reply })?;
        Self::await_outcome(outcome).await
    }

    /// Ask the paired peer to create, apply and forward an answer.
    pub async fn request_answer(&self) -> Result<(), PeerError> {
        let (reply, outcome) = oneshot::channel();
        self.send(SignalMessage::CreateAnswer { reply })?;
        Self::await_outcome(outcome).await
    }

    /// Fire-and-forget candidate relay.
    pub fn forward_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError> {
        self.send(SignalMessage::RemoteCandidate(candidate))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, message: SignalMessage) -> Result<(), PeerError> {
        self.tx
            .send(message)
            .map_err(|_| PeerError::SignalingError("paired peer is gone".to_string()))
    }

    async fn await_outcome(
        outcome: oneshot::Receiver<Result<(), PeerError>>,
    ) -> Result<(), PeerError> {
        outcome.await.map_err(|_| {
            PeerError::SignalingError("paired peer dropped the request".to_string())
        })?
    }
}

/// Receiving side, drained by the owning peer's signaling task.
#[derive(Debug)]
pub struct PeerInbox {
    rx: mpsc::UnboundedReceiver<SignalMessage>,
}

impl PeerInbox {
    pub(crate) async fn recv(&mut self) -> Option<SignalMessage> {
        self.rx.recv().await
    }
}
