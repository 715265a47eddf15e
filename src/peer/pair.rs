use crate::config::PeerPairConfig;
use crate::engine::NegotiationEngine;
use crate::errors::PeerError;
use crate::peer::connection::{Peer, PeerSetup};
use crate::peer::signaling::signaling_channel;
use crate::types::Role;
use crate::ui::UiDispatcher;
use std::sync::Arc;

/// The two peers of one process, wired to each other.
pub struct PeerPair {
    pub initiator: Arc<Peer>,
    pub responder: Arc<Peer>,
}

impl PeerPair {
    /// Build both signaling channels first, then both peers, so each peer
    /// gets its partner's link as a constructor argument.
    pub async fn connect(
        engine: &dyn NegotiationEngine,
        config: &PeerPairConfig,
        ui: &UiDispatcher,
    ) -> Result<Self, PeerError> {
        let relay = config.signaling.relay_ice_candidates;
        let (to_initiator, initiator_inbox) = signaling_channel();
        let (to_responder, responder_inbox) = signaling_channel();

        let initiator = Peer::connect(
            PeerSetup::new(Role::Initiator).with_candidate_relay(relay),
            engine,
            config,
            to_responder,
            initiator_inbox,
            ui.clone(),
        )
        .await?;

        let responder = match Peer::connect(
            PeerSetup::new(Role::Responder).with_candidate_relay(relay),
            engine,
            config,
            to_initiator,
            responder_inbox,
            ui.clone(),
        )
        .await
        {
            Ok(peer) => peer,
            Err(e) => {
                let _ = initiator.close().await;
                return Err(e);
            }
        };

        log::info!(
            "Paired peers {} -> {}",
            initiator.id(),
            responder.id()
        );
        Ok(Self {
            initiator,
            responder,
        })
    }

    /// Run the single offer/answer round.
    pub async fn negotiate(&self) -> Result<(), PeerError> {
        self.initiator.create_offer().await
    }

    /// Close both connections, reporting the first failure.
    pub async fn close(&self) -> Result<(), PeerError> {
        let initiator = self.initiator.close().await;
        let responder = self.responder.close().await;
        initiator.and(responder)
    }
}
