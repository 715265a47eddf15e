use crate::config::PeerPairConfig;
use crate::engine::{event_channel, EngineConnection, EngineEventReceiver, NegotiationEngine};
use crate::errors::PeerError;
use crate::peer::coordinator::next_step;
use crate::peer::events::relay_engine_events;
use crate::peer::signaling::{PeerInbox, PeerLink, SignalMessage};
use crate::peer::stats::{ExchangeStats, StatsCounters};
use crate::types::{IceCandidate, Role, SessionDescription};
use crate::ui::UiDispatcher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Identity and behaviour switches for one peer
#[derive(Debug, Clone)]
pub struct PeerSetup {
    pub id: String,
    pub role: Role,
    pub relay_ice_candidates: bool,
}

impl PeerSetup {
    pub fn new(role: Role) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            id: format!("{}-{}", role, &suffix[..8]),
            role,
            relay_ice_candidates: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_candidate_relay(mut self, enabled: bool) -> Self {
        self.relay_ice_candidates = enabled;
        self
    }
}

#[derive(Debug, Default)]
struct CandidateBuffer {
    remote_applied: bool,
    pending: Vec<IceCandidate>,
}

/// One endpoint of the in-process exchange.
///
/// The paired-peer link is fixed at construction. Engine notifications and
/// signaling requests from the paired peer are handled on background tasks
/// that only hold a weak reference, so dropping the last `Arc<Peer>` ends
/// them.
pub struct Peer {
    pub(crate) id: String,
    role: Role,
    connection: Arc<dyn EngineConnection>,
    pub(crate) paired: PeerLink,
    pub(crate) ui: UiDispatcher,
    pub(crate) relay_ice_candidates: bool,
    candidates: Mutex<CandidateBuffer>,
    /// Set by the first `create_offer`; the exchange runs once.
    offer_sent: AtomicBool,
    pub(crate) stats: StatsCounters,
}

impl Peer {
    /// Create the engine connection and start the peer.
    pub async fn connect(
        setup: PeerSetup,
        engine: &dyn NegotiationEngine,
        config: &PeerPairConfig,
        paired: PeerLink,
        inbox: PeerInbox,
        ui: UiDispatcher,
    ) -> Result<Arc<Self>, PeerError> {
        let (events_tx, events_rx) = event_channel();
        let connection = engine
            .create_connection(&config.connection, events_tx)
            .await
            .map_err(|e| {
                log::error!("Peer {}: connection create failed: {}", setup.id, e);
                e
            })?;

        log::info!("Peer {} ({}) connected to engine", setup.id, setup.role);
        Ok(Self::start(setup, connection, events_rx, paired, inbox, ui))
    }

    /// Start a peer around an existing engine connection.
    ///
    /// Must run inside a tokio runtime: the signaling and event tasks are
    /// spawned here, before any engine activity can reach the peer.
    pub fn start(
        setup: PeerSetup,
        connection: Arc<dyn EngineConnection>,
        events: EngineEventReceiver,
        paired: PeerLink,
        inbox: PeerInbox,
        ui: UiDispatcher,
    ) -> Arc<Self> {
        let peer = Arc::new(Self {
            id: setup.id,
            role: setup.role,
            connection,
            paired,
            ui,
            relay_ice_candidates: setup.relay_ice_candidates,
            candidates: Mutex::new(CandidateBuffer::default()),
            offer_sent: AtomicBool::new(false),
            stats: StatsCounters::default(),
        });

        tokio::spawn(run_inbox(Arc::downgrade(&peer), inbox));
        tokio::spawn(relay_engine_events(Arc::downgrade(&peer), events));
        peer
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn connection(&self) -> &Arc<dyn EngineConnection> {
        &self.connection
    }

    pub fn stats(&self) -> ExchangeStats {
        self.stats.snapshot()
    }

    /// Start the exchange. Resolves once the paired peer's answer has been
    /// applied here, or with the first failure along the way. Only the first
    /// call runs; later calls are rejected even if that round failed.
    pub async fn create_offer(&self) -> Result<(), PeerError> {
        if !self.role.is_initiator() {
            return Err(PeerError::SignalingError(format!(
                "peer {} is not the initiator",
                self.id
            )));
        }
        if self.offer_sent.swap(true, Ordering::SeqCst) {
            return Err(PeerError::SignalingError(format!(
                "peer {} already sent its offer",
                self.id
            )));
        }

        log::info!("Peer {}: creating offer", self.id);
        let offer = self.connection.create_offer().await.map_err(|e| {
            log::error!("Peer {}: {}", self.id, e);
            e
        })?;
        StatsCounters::bump(&self.stats.offers_created);

        self.on_description_ready(offer).await
    }

    /// Create an answer to the applied remote offer and hand it back.
    pub async fn create_answer(&self) -> Result<(), PeerError> {
        log::info!("Peer {}: creating answer", self.id);
        let answer = self.connection.create_answer().await.map_err(|e| {
            log::error!("Peer {}: {}", self.id, e);
            e
        })?;
        StatsCounters::bump(&self.stats.answers_created);

        self.on_description_ready(answer).await
    }

    /// Handle a description the engine just produced for this peer.
    ///
    /// Applies it locally, forwards it once to the paired peer and, on the
    /// initiator, asks the paired peer for an answer. A failed local apply
    /// stops here; the description is not forwarded.
    pub async fn on_description_ready(
        &self,
        description: SessionDescription,
    ) -> Result<(), PeerError> {
        log::info!(
            "Peer {} ({}): {:?} ready",
            self.id,
            self.role,
            description.sdp_type
        );
        let step = next_step(self.role);

        self.set_local_description(description.clone()).await?;

        self.paired
            .forward_description(description)
            .await
            .map_err(|e| {
                log::error!("Peer {}: forwarding description failed: {}", self.id, e);
                e
            })?;
        StatsCounters::bump(&self.stats.descriptions_forwarded);

        if step.requests_answer() {
            self.paired.request_answer().await.map_err(|e| {
                log::error!("Peer {}: answer round failed: {}", self.id, e);
                e
            })?;
        }
        Ok(())
    }

    pub async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), PeerError> {
        log::info!("Peer {} ({}): set local description", self.id, self.role);
        self.connection
            .set_local_description(description)
            .await
            .map_err(|e| {
                log::error!("Peer {}: {}", self.id, e);
                e
            })?;
        StatsCounters::bump(&self.stats.local_descriptions_applied);
        Ok(())
    }

    /// Apply a description from the paired peer, then flush any ICE
    /// candidates that arrived ahead of it.
    pub async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), PeerError> {
        log::info!("Peer {} ({}): set remote description", self.id, self.role);
        self.connection
            .set_remote_description(description)
            .await
            .map_err(|e| {
                log::error!("Peer {}: {}", self.id, e);
                e
            })?;
        StatsCounters::bump(&self.stats.remote_descriptions_applied);

        let pending = match self.candidates.lock() {
            Ok(mut buffer) => {
                buffer.remote_applied = true;
                std::mem::take(&mut buffer.pending)
            }
            Err(_) => {
                return Err(PeerError::SignalingError(
                    "candidate buffer lock poisoned".to_string(),
                ))
            }
        };
        if !pending.is_empty() {
            log::debug!(
                "Peer {}: applying {} buffered candidates",
                self.id,
                pending.len()
            );
        }
        for candidate in pending {
            self.apply_candidate(candidate).await;
        }
        Ok(())
    }

    /// Add a candidate from the paired peer, buffering it while no remote
    /// description is applied yet.
    pub async fn add_remote_candidate(&self, candidate: IceCandidate) {
        let ready = match self.candidates.lock() {
            Ok(mut buffer) => {
                if !buffer.remote_applied {
                    buffer.pending.push(candidate.clone());
                }
                buffer.remote_applied
            }
            Err(_) => {
                log::error!("Peer {}: candidate buffer lock poisoned", self.id);
                return;
            }
        };
        if ready {
            self.apply_candidate(candidate).await;
        }
    }

    async fn apply_candidate(&self, candidate: IceCandidate) {
        match self.connection.add_ice_candidate(candidate).await {
            Ok(()) => StatsCounters::bump(&self.stats.candidates_applied),
            Err(e) => log::warn!("Peer {}: {}", self.id, e),
        }
    }

    pub async fn close(&self) -> Result<(), PeerError> {
        log::info!("Closing peer {}", self.id);
        self.connection.close().await
    }

    async fn handle_signal(&self, message: SignalMessage) {
        match message {
            SignalMessage::RemoteDescription { description, reply } => {
                let result = self.set_remote_description(description).await;
                let _ = reply.send(result);
            }
            SignalMessage::CreateAnswer { reply } => {
                let result = self.create_answer().await;
                let _ = reply.send(result);
            }
            SignalMessage::RemoteCandidate(candidate) => {
                self.add_remote_candidate(candidate).await;
            }
        }
    }
}

async fn run_inbox(peer: Weak<Peer>, mut inbox: PeerInbox) {
    while let Some(message) = inbox.recv().await {
        let Some(strong) = peer.upgrade() else {
            break;
        };
        strong.handle_signal(message).await;
    }
}
