//! Engine notification handling.
//!
//! Runs on whatever task the engine reports from. Nothing here touches the
//! UI surface directly: new tracks are queued for the UI thread.

use crate::engine::{EngineEvent, EngineEventReceiver};
use crate::peer::connection::Peer;
use crate::peer::stats::StatsCounters;
use crate::ui::UiMessage;
use std::sync::Weak;

impl Peer {
    pub fn handle_engine_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::TrackAdded(track) => {
                log::info!(
                    "Peer {}: remote {} track added: {}",
                    self.id,
                    track.kind,
                    track.id
                );
                StatsCounters::bump(&self.stats.tracks_announced);
                if let Err(e) = self.ui.queue_ui_callback(UiMessage::NewTrackAdded(track)) {
                    log::error!("Peer {}: {}", self.id, e);
                }
            }
            EngineEvent::TrackRemoved(track_id) => {
                log::info!("Peer {}: remote track removed: {}", self.id, track_id);
            }
            EngineEvent::IceCandidate(candidate) => {
                log::debug!("Peer {}: ICE candidate {}", self.id, candidate.candidate);
                if self.relay_ice_candidates {
                    match self.paired.forward_candidate(candidate) {
                        Ok(()) => StatsCounters::bump(&self.stats.candidates_relayed),
                        Err(e) => log::warn!("Peer {}: candidate not relayed: {}", self.id, e),
                    }
                }
            }
        }
    }
}

pub(crate) async fn relay_engine_events(peer: Weak<Peer>, mut events: EngineEventReceiver) {
    while let Some(event) = events.recv().await {
        let Some(strong) = peer.upgrade() else {
            break;
        };
        strong.handle_engine_event(event);
    }
}
