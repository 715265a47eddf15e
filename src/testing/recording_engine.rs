//! Deterministic in-memory engine that records every call made on it.

use crate::config::ConnectionConfig;
use crate::engine::{EngineConnection, EngineEvent, EngineEventSender, NegotiationEngine};
use crate::errors::PeerError;
use crate::types::{IceCandidate, LocalTrack, RemoteTrack, SessionDescription, TrackKind};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One call observed on a [`RecordingConnection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    AddTrack(LocalTrack),
    CreateOffer,
    CreateAnswer,
    SetLocalDescription(SessionDescription),
    SetRemoteDescription(SessionDescription),
    AddIceCandidate(IceCandidate),
    Close,
}

/// How a recorded connection should behave, including which calls fail
#[derive(Debug, Clone, Default)]
pub struct ConnectionPlan {
    pub fail_create_connection: bool,
    pub fail_create_offer: bool,
    pub fail_create_answer: bool,
    pub fail_set_local: bool,
    pub fail_set_remote: bool,
    pub reject_video_tracks: bool,
    /// Candidates reported right after each local description is applied
    pub candidates_on_local: usize,
}

#[derive(Default)]
pub struct RecordingEngine {
    plans: HashMap<usize, ConnectionPlan>,
    attempts: AtomicUsize,
    connections: Mutex<HashMap<usize, Arc<RecordingConnection>>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `plan` to the connection created at position `index` (0-based).
    pub fn with_plan(mut self, index: usize, plan: ConnectionPlan) -> Self {
        self.plans.insert(index, plan);
        self
    }

    pub fn connection(&self, index: usize) -> Option<Arc<RecordingConnection>> {
        self.connections
            .lock()
            .ok()
            .and_then(|connections| connections.get(&index).cloned())
    }

    pub fn connections_created(&self) -> usize {
        self.connections.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl NegotiationEngine for RecordingEngine {
    async fn create_connection(
        &self,
        config: &ConnectionConfig,
        events: EngineEventSender,
    ) -> Result<Arc<dyn EngineConnection>, PeerError> {
        config.validate()?;

        let index = self.attempts.fetch_add(1, Ordering::SeqCst);
        let plan = self.plans.get(&index).cloned().unwrap_or_default();
        if plan.fail_create_connection {
            return Err(PeerError::SetupError(format!(
                "connection {} refused by plan",
                index
            )));
        }

        let connection = Arc::new(RecordingConnection {
            label: format!("conn-{}", index),
            plan,
            events,
            calls: Mutex::new(Vec::new()),
            tracks: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(1),
        });
        self.connections
            .lock()
            .map_err(|_| PeerError::SetupError("connection registry poisoned".to_string()))?
            .insert(index, Arc::clone(&connection));

        Ok(connection)
    }
}

pub struct RecordingConnection {
    label: String,
    plan: ConnectionPlan,
    events: EngineEventSender,
    calls: Mutex<Vec<EngineCall>>,
    tracks: Mutex<Vec<LocalTrack>>,
    sequence: AtomicU64,
}

impl RecordingConnection {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    /// Raise an engine notification as if the engine's own thread did.
    pub fn emit(&self, event: EngineEvent) -> bool {
        self.events.send(event).is_ok()
    }

    fn record(&self, call: EngineCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn render_sdp(&self) -> String {
        let version = self.sequence.fetch_add(1, Ordering::SeqCst);
        let mut sdp = format!(
            "v=0\r\no=- 0 {} IN IP4 127.0.0.1\r\ns={}\r\nt=0 0\r\n",
            version, self.label
        );
        if let Ok(tracks) = self.tracks.lock() {
            for track in tracks.iter() {
                sdp.push_str(&format!(
                    "m={} 9 UDP/TLS/RTP/SAVPF 96\r\na=msid:{} {}\r\n",
                    track.kind, track.stream_id, track.id
                ));
            }
        }
        sdp
    }

    fn announce_remote_tracks(&self, desc: &SessionDescription) {
        let mut kind = None;
        for line in desc.sdp.lines() {
            if let Some(media) = line.strip_prefix("m=") {
                kind = match media.split_whitespace().next() {
                    Some("audio") => Some(TrackKind::Audio),
                    Some("video") => Some(TrackKind::Video),
                    _ => None,
                };
            } else if let (Some(msid), Some(kind)) = (line.strip_prefix("a=msid:"), kind) {
                let mut parts = msid.split_whitespace();
                if let (Some(stream_id), Some(id)) = (parts.next(), parts.next()) {
                    let _ = self.events.send(EngineEvent::TrackAdded(RemoteTrack {
                        id: id.to_string(),
                        stream_id: stream_id.to_string(),
                        kind,
                    }));
                }
            }
        }
    }
}

#[async_trait]
impl EngineConnection for RecordingConnection {
    async fn add_track(&self, track: &LocalTrack) -> Result<(), PeerError> {
        self.record(EngineCall::AddTrack(track.clone()));
        if self.plan.reject_video_tracks && track.kind == TrackKind::Video {
            return Err(PeerError::SetupError(format!(
                "{} rejected video track {}",
                self.label, track.id
            )));
        }
        if let Ok(mut tracks) = self.tracks.lock() {
            tracks.push(track.clone());
        }
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, PeerError> {
        self.record(EngineCall::CreateOffer);
        if self.plan.fail_create_offer {
            return Err(PeerError::NegotiationError("offer refused by plan".to_string()));
        }
        Ok(SessionDescription::offer(self.render_sdp()))
    }

    async fn create_answer(&self) -> Result<SessionDescription, PeerError> {
        self.record(EngineCall::CreateAnswer);
        if self.plan.fail_create_answer {
            return Err(PeerError::NegotiationError("answer refused by plan".to_string()));
        }
        Ok(SessionDescription::answer(self.render_sdp()))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        self.record(EngineCall::SetLocalDescription(desc));
        if self.plan.fail_set_local {
            return Err(PeerError::NegotiationError(
                "local description refused by plan".to_string(),
            ));
        }
        for n in 0..self.plan.candidates_on_local {
            let _ = self.events.send(EngineEvent::IceCandidate(IceCandidate {
                candidate: format!(
                    "candidate:{} 1 UDP 2122260223 127.0.0.1 {} typ host",
                    n + 1,
                    50000 + n
                ),
                sdp_mid: Some("0".to_string()),
                sdp_mline_index: Some(0),
            }));
        }
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        self.record(EngineCall::SetRemoteDescription(desc.clone()));
        if self.plan.fail_set_remote {
            return Err(PeerError::NegotiationError(
                "remote description refused by plan".to_string(),
            ));
        }
        self.announce_remote_tracks(&desc);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError> {
        self.record(EngineCall::AddIceCandidate(candidate));
        Ok(())
    }

    async fn close(&self) -> Result<(), PeerError> {
        self.record(EngineCall::Close);
        Ok(())
    }
}
