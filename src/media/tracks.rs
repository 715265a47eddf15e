use crate::config::{MediaConfig, UiConfig};
use crate::engine::EngineConnection;
use crate::errors::PeerError;
use crate::media::devices::{open_video_capture_device, CaptureSource, DeviceEnumerator};
use crate::types::LocalTrack;
use crate::ui::{UiDispatcher, UiMessage};
use std::sync::Arc;

/// Why a connection is sending less than audio plus video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// Video disabled in the configuration
    VideoDisabled,
    /// No capture device could be opened
    NoCaptureDevice,
    /// A track was created but the engine refused it
    TrackRejected(PeerError),
}

/// What [`attach_tracks`] ended up registering with the connection.
#[derive(Debug, Default)]
pub struct AttachedTracks {
    pub audio: Option<LocalTrack>,
    pub video: Option<LocalTrack>,
    /// Keeps the capture device open while the video track exists
    pub capture: Option<Arc<CaptureSource>>,
    pub degradations: Vec<Degradation>,
}

impl AttachedTracks {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    pub fn is_audio_only(&self) -> bool {
        self.audio.is_some() && self.video.is_none()
    }
}

/// Create the local tracks and register them with `connection`.
///
/// A missing camera or a rejected track degrades the session instead of
/// failing it; only a gone UI thread is reported as an error.
pub async fn attach_tracks(
    connection: &dyn EngineConnection,
    devices: &dyn DeviceEnumerator,
    ui: &UiDispatcher,
    media: &MediaConfig,
    ui_config: &UiConfig,
) -> Result<AttachedTracks, PeerError> {
    log::info!("Attaching local tracks");
    let mut attached = AttachedTracks::default();

    let audio_track = LocalTrack::audio(media.audio_label.clone(), media.stream_id.clone());
    match connection.add_track(&audio_track).await {
        Ok(()) => attached.audio = Some(audio_track),
        Err(e) => {
            log::error!("Failed to add audio track to connection: {}", e);
            attached.degradations.push(Degradation::TrackRejected(e));
        }
    }

    let source = if media.video_enabled {
        open_video_capture_device(devices, media.preferred_device.as_deref())
    } else {
        attached.degradations.push(Degradation::VideoDisabled);
        None
    };

    match source {
        Some(source) => {
            let video_track = LocalTrack::video(
                media.video_label.clone(),
                media.stream_id.clone(),
                source.device().id.clone(),
            );
            log::info!("Using capture device {}", source.device().name);

            if ui_config.render_local_preview {
                ui.queue_ui_callback(UiMessage::StartLocalRenderer(video_track.clone()))?;
            }

            match connection.add_track(&video_track).await {
                Ok(()) => {
                    attached.video = Some(video_track);
                    attached.capture = Some(Arc::new(source));
                }
                Err(e) => {
                    log::error!("Failed to add video track to connection: {}", e);
                    attached.degradations.push(Degradation::TrackRejected(e));
                }
            }
        }
        None if media.video_enabled => {
            log::warn!("No usable capture device, continuing audio-only");
            attached.degradations.push(Degradation::NoCaptureDevice);
        }
        None => {}
    }

    ui.queue_ui_callback(UiMessage::SwitchToStreamingUi)?;
    Ok(attached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PeerPairConfig;
    use crate::engine::{event_channel, NegotiationEngine};
    use crate::testing::{ConnectionPlan, EngineCall, RecordingEngine, StaticDevices};
    use crate::types::{CaptureDeviceInfo, TrackKind};
    use crate::ui::ui_queue;

    #[tokio::test]
    async fn test_audio_and_video_attached() {
        let config = PeerPairConfig::default();
        let engine = RecordingEngine::new();
        let (events, _rx) = event_channel();
        let connection = engine
            .create_connection(&config.connection, events)
            .await
            .unwrap();
        let devices = StaticDevices::with_devices(vec![CaptureDeviceInfo::new(
            "0".to_string(),
            "Desk Cam".to_string(),
        )]);
        let (ui, receiver) = ui_queue();

        let attached = attach_tracks(connection.as_ref(), &devices, &ui, &config.media, &config.ui)
            .await
            .unwrap();

        assert!(!attached.is_degraded());
        assert_eq!(attached.video.as_ref().unwrap().kind, TrackKind::Video);
        assert!(attached.capture.is_some());

        let recorded = engine.connection(0).unwrap();
        let added: Vec<_> = recorded
            .calls()
            .into_iter()
            .filter(|c| matches!(c, EngineCall::AddTrack(_)))
            .collect();
        assert_eq!(added.len(), 2);

        // local preview + streaming view
        assert_eq!(receiver.pending(), 2);
    }

    #[tokio::test]
    async fn test_video_disabled_skips_enumeration() {
        let mut config = PeerPairConfig::default();
        config.media.video_enabled = false;
        let engine = RecordingEngine::new();
        let (events, _rx) = event_channel();
        let connection = engine
            .create_connection(&config.connection, events)
            .await
            .unwrap();
        let (ui, _receiver) = ui_queue();

        let attached = attach_tracks(
            connection.as_ref(),
            &StaticDevices::broken("should not be asked"),
            &ui,
            &config.media,
            &config.ui,
        )
        .await
        .unwrap();

        assert!(attached.is_audio_only());
        assert_eq!(attached.degradations, vec![Degradation::VideoDisabled]);
    }

    #[tokio::test]
    async fn test_rejected_video_track_is_degradation() {
        let config = PeerPairConfig::default();
        let engine = RecordingEngine::new().with_plan(
            0,
            ConnectionPlan {
                reject_video_tracks: true,
                ..Default::default()
            },
        );
        let (events, _rx) = event_channel();
        let connection = engine
            .create_connection(&config.connection, events)
            .await
            .unwrap();
        let devices = StaticDevices::with_devices(vec![CaptureDeviceInfo::new(
            "0".to_string(),
            "Desk Cam".to_string(),
        )]);
        let (ui, _receiver) = ui_queue();

        let attached = attach_tracks(connection.as_ref(), &devices, &ui, &config.media, &config.ui)
            .await
            .unwrap();

        assert!(attached.is_audio_only());
        assert!(matches!(
            attached.degradations.as_slice(),
            [Degradation::TrackRejected(PeerError::SetupError(_))]
        ));
    }
}
