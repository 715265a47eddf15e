//! Loopback session: both peers, their local media and one negotiation.

use crate::config::PeerPairConfig;
use crate::engine::NegotiationEngine;
use crate::errors::PeerError;
use crate::media::{attach_tracks, AttachedTracks, DeviceEnumerator};
use crate::peer::{ExchangeStats, PeerPair};
use crate::ui::{UiDispatcher, UiMessage};
use serde::Serialize;

/// Counters for both sides of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub initiator: ExchangeStats,
    pub responder: ExchangeStats,
}

pub struct LoopbackSession {
    pair: PeerPair,
    initiator_tracks: AttachedTracks,
    responder_tracks: Option<AttachedTracks>,
}

impl LoopbackSession {
    /// Show the peer list, connect both peers and attach local media.
    ///
    /// If attaching fails once both peers exist, both connections are
    /// closed before the error is returned.
    pub async fn establish(
        engine: &dyn NegotiationEngine,
        devices: &dyn DeviceEnumerator,
        ui: &UiDispatcher,
        config: &PeerPairConfig,
    ) -> Result<Self, PeerError> {
        config.validate()?;
        ui.queue_ui_callback(UiMessage::SwitchToPeerList(Vec::new()))?;

        let pair = PeerPair::connect(engine, config, ui).await?;

        match Self::attach_local_media(&pair, devices, ui, config).await {
            Ok((initiator_tracks, responder_tracks)) => Ok(Self {
                pair,
                initiator_tracks,
                responder_tracks,
            }),
            Err(e) => {
                log::error!("Session setup failed after connecting: {}", e);
                if let Err(close_err) = pair.close().await {
                    log::warn!("Closing peers after failed setup: {}", close_err);
                }
                Err(e)
            }
        }
    }

    async fn attach_local_media(
        pair: &PeerPair,
        devices: &dyn DeviceEnumerator,
        ui: &UiDispatcher,
        config: &PeerPairConfig,
    ) -> Result<(AttachedTracks, Option<AttachedTracks>), PeerError> {
        let initiator_tracks = attach_tracks(
            pair.initiator.connection().as_ref(),
            devices,
            ui,
            &config.media,
            &config.ui,
        )
        .await?;

        let responder_tracks = if config.media.attach_on_responder {
            Some(
                attach_tracks(
                    pair.responder.connection().as_ref(),
                    devices,
                    ui,
                    &config.media,
                    &config.ui,
                )
                .await?,
            )
        } else {
            None
        };

        Ok((initiator_tracks, responder_tracks))
    }

    /// Run the offer/answer round.
    pub async fn negotiate(&self) -> Result<(), PeerError> {
        log::info!("Starting offer/answer exchange");
        self.pair.negotiate().await?;
        log::info!("Offer/answer exchange complete");
        Ok(())
    }

    pub fn pair(&self) -> &PeerPair {
        &self.pair
    }

    pub fn initiator_tracks(&self) -> &AttachedTracks {
        &self.initiator_tracks
    }

    pub fn responder_tracks(&self) -> Option<&AttachedTracks> {
        self.responder_tracks.as_ref()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            initiator: self.pair.initiator.stats(),
            responder: self.pair.responder.stats(),
        }
    }

    pub async fn close(self) -> Result<(), PeerError> {
        self.pair.close().await
    }
}
