use crate::config::{BundlePolicy, ConnectionConfig, IceServer, IceTransportPolicy};
use crate::engine::{EngineConnection, EngineEvent, EngineEventSender, NegotiationEngine};
use crate::errors::PeerError;
use crate::types::{IceCandidate, LocalTrack, RemoteTrack, SdpType, SessionDescription, TrackKind};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MediaEngine, MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::policy::bundle_policy::RTCBundlePolicy;
use webrtc::peer_connection::policy::ice_transport_policy::RTCIceTransportPolicy;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

impl From<IceServer> for RTCIceServer {
    fn from(server: IceServer) -> Self {
        RTCIceServer {
            urls: server.urls,
            username: server.username.unwrap_or_default(),
            credential: server.credential.unwrap_or_default(),
            ..Default::default()
        }
    }
}

impl From<SdpType> for RTCSdpType {
    fn from(sdp_type: SdpType) -> Self {
        match sdp_type {
            SdpType::Offer => RTCSdpType::Offer,
            SdpType::Answer => RTCSdpType::Answer,
            SdpType::Pranswer => RTCSdpType::Pranswer,
            SdpType::Rollback => RTCSdpType::Rollback,
        }
    }
}

impl From<RTCSdpType> for SdpType {
    fn from(sdp_type: RTCSdpType) -> Self {
        match sdp_type {
            RTCSdpType::Offer => SdpType::Offer,
            RTCSdpType::Answer => SdpType::Answer,
            RTCSdpType::Pranswer => SdpType::Pranswer,
            RTCSdpType::Rollback => SdpType::Rollback,
            RTCSdpType::Unspecified => SdpType::Offer,
        }
    }
}

impl TryFrom<SessionDescription> for RTCSessionDescription {
    type Error = PeerError;

    fn try_from(desc: SessionDescription) -> Result<Self, Self::Error> {
        match desc.sdp_type {
            SdpType::Offer => RTCSessionDescription::offer(desc.sdp)
                .map_err(|e| PeerError::NegotiationError(format!("Invalid SDP offer: {}", e))),
            SdpType::Answer => RTCSessionDescription::answer(desc.sdp)
                .map_err(|e| PeerError::NegotiationError(format!("Invalid SDP answer: {}", e))),
            SdpType::Pranswer => RTCSessionDescription::pranswer(desc.sdp)
                .map_err(|e| PeerError::NegotiationError(format!("Invalid SDP pranswer: {}", e))),
            SdpType::Rollback => Err(PeerError::NegotiationError(
                "Rollback SDP type not supported".to_string(),
            )),
        }
    }
}

impl From<RTCSessionDescription> for SessionDescription {
    fn from(desc: RTCSessionDescription) -> Self {
        SessionDescription {
            sdp_type: desc.sdp_type.into(),
            sdp: desc.sdp,
        }
    }
}

impl From<RTCIceCandidateInit> for IceCandidate {
    fn from(init: RTCIceCandidateInit) -> Self {
        IceCandidate {
            candidate: init.candidate,
            sdp_mid: init.sdp_mid,
            sdp_mline_index: init.sdp_mline_index,
        }
    }
}

impl From<IceCandidate> for RTCIceCandidateInit {
    fn from(candidate: IceCandidate) -> Self {
        RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_mline_index,
            username_fragment: None,
        }
    }
}

fn rtc_configuration(config: &ConnectionConfig) -> RTCConfiguration {
    RTCConfiguration {
        ice_servers: config
            .ice_servers
            .iter()
            .cloned()
            .map(RTCIceServer::from)
            .collect(),
        ice_transport_policy: match config.ice_transport_policy {
            IceTransportPolicy::Relay => RTCIceTransportPolicy::Relay,
            IceTransportPolicy::All => RTCIceTransportPolicy::All,
        },
        bundle_policy: match config.bundle_policy {
            BundlePolicy::Balanced => RTCBundlePolicy::Balanced,
            BundlePolicy::MaxCompat => RTCBundlePolicy::MaxCompat,
            BundlePolicy::MaxBundle => RTCBundlePolicy::MaxBundle,
        },
        ..Default::default()
    }
}

fn codec_for(kind: TrackKind) -> RTCRtpCodecCapability {
    match kind {
        TrackKind::Audio => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: 48000,
            channels: 2,
            ..Default::default()
        },
        TrackKind::Video => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            clock_rate: 90000,
            ..Default::default()
        },
    }
}

/// Engine backed by webrtc-rs.
///
/// webrtc-rs only speaks unified plan and always runs DTLS-SRTP, so the
/// fixed parts of [`ConnectionConfig`] are checked and then satisfied by the
/// library itself.
#[derive(Debug, Default, Clone)]
pub struct RtcEngine;

impl RtcEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NegotiationEngine for RtcEngine {
    async fn create_connection(
        &self,
        config: &ConnectionConfig,
        events: EngineEventSender,
    ) -> Result<Arc<dyn EngineConnection>, PeerError> {
        config.validate()?;

        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| PeerError::SetupError(format!("Failed to register codecs: {}", e)))?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|e| {
                PeerError::SetupError(format!("Failed to register interceptors: {}", e))
            })?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_configuration(config))
                .await
                .map_err(|e| {
                    PeerError::SetupError(format!("Failed to create peer connection: {}", e))
                })?,
        );

        let connection = RtcConnection {
            peer_connection,
            events,
            announced: Arc::new(Mutex::new(HashSet::new())),
        };
        connection.register_handlers();

        Ok(Arc::new(connection))
    }
}

/// A webrtc-rs peer connection plus the event sink it reports into.
pub struct RtcConnection {
    peer_connection: Arc<RTCPeerConnection>,
    events: EngineEventSender,
    /// Remote track ids already reported, so a track announced from the
    /// remote description is not reported again when its first packet lands.
    announced: Arc<Mutex<HashSet<String>>>,
}

impl RtcConnection {
    fn register_handlers(&self) {
        let events = self.events.clone();
        self.peer_connection
            .on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
                if let Some(candidate) = candidate {
                    match candidate.to_json() {
                        Ok(init) => {
                            let _ = events.send(EngineEvent::IceCandidate(init.into()));
                        }
                        Err(e) => log::warn!("Failed to serialize ICE candidate: {}", e),
                    }
                }
                Box::pin(async {})
            }));

        let events = self.events.clone();
        let announced = Arc::clone(&self.announced);
        self.peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>, _receiver, _transceiver| {
                let kind = match track.kind() {
                    RTPCodecType::Video => TrackKind::Video,
                    _ => TrackKind::Audio,
                };
                let remote = RemoteTrack {
                    id: track.id(),
                    stream_id: track.stream_id(),
                    kind,
                };
                announce(&announced, &events, remote);
                Box::pin(async {})
            },
        ));

        self.peer_connection
            .on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
                log::info!("Peer connection state changed: {}", state);
                Box::pin(async {})
            }));
    }

    /// Report the tracks a freshly applied remote description carries.
    fn announce_remote_tracks(&self, desc: &RTCSessionDescription) {
        let parsed = match desc.unmarshal() {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Could not parse remote description for tracks: {}", e);
                return;
            }
        };

        for media in &parsed.media_descriptions {
            let kind = match media.media_name.media.as_str() {
                "audio" => TrackKind::Audio,
                "video" => TrackKind::Video,
                _ => continue,
            };
            let msid = match media.attribute("msid") {
                Some(Some(value)) => value.to_string(),
                _ => continue,
            };
            let mut parts = msid.split_whitespace();
            let (Some(stream_id), Some(track_id)) = (parts.next(), parts.next()) else {
                continue;
            };
            announce(
                &self.announced,
                &self.events,
                RemoteTrack {
                    id: track_id.to_string(),
                    stream_id: stream_id.to_string(),
                    kind,
                },
            );
        }
    }
}

fn announce(announced: &Mutex<HashSet<String>>, events: &EngineEventSender, track: RemoteTrack) {
    let fresh = match announced.lock() {
        Ok(mut ids) => ids.insert(track.id.clone()),
        Err(_) => {
            log::error!("Track registry lock poisoned");
            return;
        }
    };
    if fresh {
        log::info!("Remote {} track added: {}", track.kind, track.id);
        let _ = events.send(EngineEvent::TrackAdded(track));
    }
}

#[async_trait]
impl EngineConnection for RtcConnection {
    async fn add_track(&self, track: &LocalTrack) -> Result<(), PeerError> {
        let local = Arc::new(TrackLocalStaticSample::new(
            codec_for(track.kind),
            track.id.clone(),
            track.stream_id.clone(),
        ));

        self.peer_connection
            .add_track(local as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map(|_| ())
            .map_err(|e| {
                PeerError::SetupError(format!("Failed to add {} track: {}", track.kind, e))
            })
    }

    async fn create_offer(&self) -> Result<SessionDescription, PeerError> {
        self.peer_connection
            .create_offer(None)
            .await
            .map(SessionDescription::from)
            .map_err(|e| PeerError::NegotiationError(format!("Failed to create offer: {}", e)))
    }

    async fn create_answer(&self) -> Result<SessionDescription, PeerError> {
        self.peer_connection
            .create_answer(None)
            .await
            .map(SessionDescription::from)
            .map_err(|e| PeerError::NegotiationError(format!("Failed to create answer: {}", e)))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        let rtc_desc = RTCSessionDescription::try_from(desc)?;
        self.peer_connection
            .set_local_description(rtc_desc)
            .await
            .map_err(|e| {
                PeerError::NegotiationError(format!("Failed to set local description: {}", e))
            })
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        let rtc_desc = RTCSessionDescription::try_from(desc)?;
        self.peer_connection
            .set_remote_description(rtc_desc.clone())
            .await
            .map_err(|e| {
                PeerError::NegotiationError(format!("Failed to set remote description: {}", e))
            })?;
        self.announce_remote_tracks(&rtc_desc);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError> {
        self.peer_connection
            .add_ice_candidate(candidate.into())
            .await
            .map_err(|e| PeerError::NegotiationError(format!("Failed to add ICE candidate: {}", e)))
    }

    async fn close(&self) -> Result<(), PeerError> {
        self.peer_connection
            .close()
            .await
            .map_err(|e| PeerError::SetupError(format!("Failed to close peer connection: {}", e)))
    }
}
