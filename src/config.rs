//! Configuration management for peerpair
//!
//! Provides configuration loading, saving, and validation for the engine
//! connection, local media, signaling behaviour and the UI relay.

use crate::errors::PeerError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerPairConfig {
    pub connection: ConnectionConfig,
    pub media: MediaConfig,
    pub signaling: SignalingConfig,
    pub ui: UiConfig,
}

/// Engine connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// SDP dialect; only unified plan is accepted
    pub sdp_semantics: SdpSemantics,
    /// DTLS-SRTP media encryption; must stay enabled
    pub enable_dtls_srtp: bool,
    /// ICE servers (empty is fine for two peers in one process)
    pub ice_servers: Vec<IceServer>,
    pub ice_transport_policy: IceTransportPolicy,
    pub bundle_policy: BundlePolicy,
}

/// ICE server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SdpSemantics {
    UnifiedPlan,
    PlanB,
}

/// ICE transport policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IceTransportPolicy {
    Relay,
    All,
}

/// Bundle policy for RTC connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BundlePolicy {
    Balanced,
    MaxCompat,
    MaxBundle,
}

/// Local media configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Label of the synthesized audio track
    pub audio_label: String,
    /// Label of the capture-backed video track
    pub video_label: String,
    /// Stream id both local tracks are grouped under
    pub stream_id: String,
    /// Capture device name to try before the others
    pub preferred_device: Option<String>,
    /// Look for a capture device at all
    pub video_enabled: bool,
    /// Attach local tracks on the responder as well as the initiator
    pub attach_on_responder: bool,
}

/// Signaling behaviour between the paired peers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalingConfig {
    /// Forward discovered ICE candidates to the paired peer
    pub relay_ice_candidates: bool,
}

/// UI relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Ask the UI to render the local video track
    pub render_local_preview: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            sdp_semantics: SdpSemantics::UnifiedPlan,
            enable_dtls_srtp: true,
            ice_servers: Vec::new(),
            ice_transport_policy: IceTransportPolicy::All,
            bundle_policy: BundlePolicy::MaxBundle,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            audio_label: "audio_label".to_string(),
            video_label: "video_label".to_string(),
            stream_id: "stream_id".to_string(),
            preferred_device: None,
            video_enabled: true,
            attach_on_responder: true,
        }
    }
}

impl Default for PeerPairConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            media: MediaConfig::default(),
            signaling: SignalingConfig {
                relay_ice_candidates: true,
            },
            ui: UiConfig {
                render_local_preview: true,
            },
        }
    }
}

impl ConnectionConfig {
    /// Check the fixed parts of the connection configuration.
    pub fn validate(&self) -> Result<(), PeerError> {
        if self.sdp_semantics != SdpSemantics::UnifiedPlan {
            return Err(PeerError::ConfigError(
                "Only unified plan SDP semantics are supported".to_string(),
            ));
        }
        if !self.enable_dtls_srtp {
            return Err(PeerError::ConfigError(
                "DTLS-SRTP cannot be disabled".to_string(),
            ));
        }
        for server in &self.ice_servers {
            if server.urls.is_empty() {
                return Err(PeerError::ConfigError(
                    "ICE server entry without urls".to_string(),
                ));
            }
            for url in &server.urls {
                if !(url.starts_with("stun:") || url.starts_with("turn:") || url.starts_with("turns:"))
                {
                    return Err(PeerError::ConfigError(format!(
                        "Invalid ICE server url: {}",
                        url
                    )));
                }
            }
        }
        if self.ice_transport_policy == IceTransportPolicy::Relay
            && !self
                .ice_servers
                .iter()
                .flat_map(|s| s.urls.iter())
                .any(|u| u.starts_with("turn"))
        {
            return Err(PeerError::ConfigError(
                "Relay-only transport policy needs a TURN server".to_string(),
            ));
        }
        Ok(())
    }
}

impl PeerPairConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PeerError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| PeerError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: PeerPairConfig = toml::from_str(&contents)
            .map_err(|e| PeerError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PeerError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    PeerError::ConfigError(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| PeerError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| PeerError::ConfigError(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("peerpair.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), PeerError> {
        self.connection.validate()?;

        if self.media.audio_label.is_empty() || self.media.video_label.is_empty() {
            return Err(PeerError::ConfigError(
                "Track labels must not be empty".to_string(),
            ));
        }
        if self.media.audio_label == self.media.video_label {
            return Err(PeerError::ConfigError(
                "Audio and video track labels must differ".to_string(),
            ));
        }
        if self.media.stream_id.is_empty() {
            return Err(PeerError::ConfigError(
                "Stream id must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
