//! Negotiation engine seam
//!
//! The engine builds SDP, gathers ICE candidates, runs DTLS-SRTP and moves
//! media. Peers only talk to it through these traits: every operation is an
//! async call whose future is the pending result (dropping it cancels the
//! wait), and unsolicited notifications arrive on an [`EngineEvent`] channel.

pub mod rtc;

use crate::config::ConnectionConfig;
use crate::errors::PeerError;
use crate::types::{IceCandidate, LocalTrack, RemoteTrack, SessionDescription};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

pub use rtc::RtcEngine;

/// Notifications the engine raises on its own threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    TrackAdded(RemoteTrack),
    TrackRemoved(String),
    IceCandidate(IceCandidate),
}

pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

pub fn event_channel() -> (EngineEventSender, EngineEventReceiver) {
    mpsc::unbounded_channel()
}

/// Factory for engine connections.
#[async_trait]
pub trait NegotiationEngine: Send + Sync {
    /// Create a connection; `events` receives every notification it raises.
    async fn create_connection(
        &self,
        config: &ConnectionConfig,
        events: EngineEventSender,
    ) -> Result<Arc<dyn EngineConnection>, PeerError>;
}

/// One engine connection, exclusively owned by a peer.
#[async_trait]
pub trait EngineConnection: Send + Sync {
    async fn add_track(&self, track: &LocalTrack) -> Result<(), PeerError>;

    async fn create_offer(&self) -> Result<SessionDescription, PeerError>;

    async fn create_answer(&self) -> Result<SessionDescription, PeerError>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PeerError>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), PeerError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError>;

    async fn close(&self) -> Result<(), PeerError>;
}
