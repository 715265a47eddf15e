//! peerpair: two WebRTC peers negotiating with each other inside one process
//!
//! A [`LoopbackSession`] creates an initiator and a responder peer, hands each
//! the other's signaling link, attaches a synthesized audio track plus a
//! capture-device video track, and runs a single offer/answer round. Tracks
//! the remote side announces are relayed to a dedicated UI thread, which is
//! the only place rendering happens.
//!
//! # Usage
//! ```rust,ignore
//! use peerpair::{LoopbackSession, PeerPairConfig, RtcEngine, SystemDevices};
//! use peerpair::ui::{HeadlessSurface, UiThread};
//!
//! let (ui_thread, ui) = UiThread::spawn(HeadlessSurface::new)?;
//! let config = PeerPairConfig::load_or_default();
//! let session = LoopbackSession::establish(&RtcEngine, &SystemDevices, &ui, &config).await?;
//! session.negotiate().await?;
//! session.close().await?;
//! ui_thread.shutdown()?;
//! ```
pub mod config;
pub mod engine;
pub mod errors;
pub mod media;
pub mod peer;
pub mod session;
pub mod types;
pub mod ui;

// Testing utilities - in-memory engine, devices and surface
pub mod testing;

// Re-exports for convenience
pub use config::PeerPairConfig;
pub use engine::{EngineConnection, EngineEvent, NegotiationEngine, RtcEngine};
pub use errors::PeerError;
pub use media::{attach_tracks, open_video_capture_device, DeviceEnumerator, SystemDevices};
pub use peer::{Peer, PeerPair, PeerSetup};
pub use session::{LoopbackSession, SessionStats};
pub use types::{
    CaptureDeviceInfo, IceCandidate, LocalTrack, Platform, RemoteTrack, Role, SessionDescription,
    TrackKind,
};

/// Detect the current platform using the Platform enum
pub fn current_platform() -> Platform {
    Platform::current()
}

/// Initialize logging for the peers and the UI thread
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "peerpair=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        platform: Platform::current(),
        native_capture: cfg!(feature = "native-capture"),
        generated_at: chrono::Utc::now(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub platform: Platform,
    pub native_capture: bool,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_platform_detection() {
        let platform = current_platform();
        assert!(!platform.as_str().is_empty());
    }

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "peerpair");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
        assert_eq!(info.native_capture, cfg!(feature = "native-capture"));
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }
}
