//! Loopback session: media attachment plus one negotiation round

use peerpair::media::{CaptureSource, Degradation};
use peerpair::testing::{EngineCall, RecordingEngine, RecordingSurface, StaticDevices, SurfaceCall};
use peerpair::types::{CaptureDeviceInfo, TrackKind};
use peerpair::ui::{ui_queue, UiReceiver};
use peerpair::{DeviceEnumerator, LoopbackSession, PeerError, PeerPairConfig};
use std::sync::Mutex;
use std::time::Duration;

/// Drops the UI receiver the first time devices are listed, so the UI
/// queue dies while tracks are being attached.
struct UiKillingDevices {
    receiver: Mutex<Option<UiReceiver>>,
    inner: StaticDevices,
}

impl DeviceEnumerator for UiKillingDevices {
    fn list_devices(&self) -> Result<Vec<CaptureDeviceInfo>, PeerError> {
        drop(self.receiver.lock().unwrap().take());
        self.inner.list_devices()
    }

    fn open(&self, device: &CaptureDeviceInfo) -> Result<CaptureSource, PeerError> {
        self.inner.open(device)
    }
}

fn desk_cam() -> StaticDevices {
    StaticDevices::with_devices(vec![CaptureDeviceInfo::new(
        "0".to_string(),
        "Desk Cam".to_string(),
    )])
}

async fn drain_until(receiver: &UiReceiver, surface: &mut RecordingSurface, expected: usize) {
    for _ in 0..100 {
        receiver.dispatch_pending(surface);
        if surface.calls().len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} surface calls, saw {:?}",
        expected,
        surface.calls()
    );
}

#[tokio::test]
async fn test_session_with_camera_renders_remote_video() {
    let engine = RecordingEngine::new();
    let config = PeerPairConfig::default();
    let (ui, ui_rx) = ui_queue();

    let session = LoopbackSession::establish(&engine, &desk_cam(), &ui, &config)
        .await
        .unwrap();
    assert!(!session.initiator_tracks().is_degraded());
    assert!(session.responder_tracks().is_some());

    session.negotiate().await.unwrap();

    let mut surface = RecordingSurface::new();
    // peer list, 2 x (local preview + streaming view), 2 remote video
    drain_until(&ui_rx, &mut surface, 7).await;
    let calls = surface.calls();
    assert_eq!(calls[0], SurfaceCall::SwitchToPeerList(vec![]));
    let remote_renders: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            SurfaceCall::StartRemoteRenderer(track) => Some(track.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(remote_renders.len(), 2);
    assert!(remote_renders.iter().all(|t| t.kind == TrackKind::Video));
    assert!(remote_renders.iter().all(|t| t.id == "video_label"));

    let stats = session.stats();
    assert_eq!(stats.initiator.tracks_announced, 2);
    assert_eq!(stats.responder.tracks_announced, 2);

    session.close().await.unwrap();
    assert_eq!(
        engine
            .connection(0)
            .unwrap()
            .count(|c| matches!(c, EngineCall::Close)),
        1
    );
}

#[tokio::test]
async fn test_session_without_devices_runs_audio_only() {
    let engine = RecordingEngine::new();
    let config = PeerPairConfig::default();
    let (ui, ui_rx) = ui_queue();

    let session = LoopbackSession::establish(&engine, &StaticDevices::none(), &ui, &config)
        .await
        .unwrap();

    let tracks = session.initiator_tracks();
    assert!(tracks.is_audio_only());
    assert_eq!(tracks.degradations, vec![Degradation::NoCaptureDevice]);
    let added: Vec<_> = engine
        .connection(0)
        .unwrap()
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            EngineCall::AddTrack(track) => Some(track),
            _ => None,
        })
        .collect();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].kind, TrackKind::Audio);
    assert_eq!(added[0].id, "audio_label");
    assert_eq!(added[0].stream_id, "stream_id");

    session.negotiate().await.unwrap();

    let mut surface = RecordingSurface::new();
    // peer list + streaming view on each side; audio tracks render nothing
    drain_until(&ui_rx, &mut surface, 3).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    ui_rx.dispatch_pending(&mut surface);
    assert!(surface
        .calls()
        .iter()
        .all(|c| !matches!(c, SurfaceCall::StartRemoteRenderer(_))));
    assert_eq!(session.stats().initiator.tracks_announced, 1);
}

#[tokio::test]
async fn test_busy_camera_falls_back_to_next_device() {
    let engine = RecordingEngine::new();
    let mut config = PeerPairConfig::default();
    config.media.attach_on_responder = false;
    config.media.preferred_device = Some("Desk Cam".to_string());
    let devices = StaticDevices::with_devices(vec![
        CaptureDeviceInfo::new("0".to_string(), "Desk Cam".to_string()),
        CaptureDeviceInfo::new("1".to_string(), "Laptop Cam".to_string()),
    ])
    .failing_open("0");
    let (ui, _ui_rx) = ui_queue();

    let session = LoopbackSession::establish(&engine, &devices, &ui, &config)
        .await
        .unwrap();

    let capture = session.initiator_tracks().capture.as_ref().unwrap();
    assert_eq!(capture.device().name, "Laptop Cam");
    assert!(session.responder_tracks().is_none());
    assert!(engine
        .connection(1)
        .unwrap()
        .calls()
        .iter()
        .all(|c| !matches!(c, EngineCall::AddTrack(_))));
}

#[tokio::test]
async fn test_invalid_config_rejected_before_any_connection() {
    let engine = RecordingEngine::new();
    let mut config = PeerPairConfig::default();
    config.media.video_label = config.media.audio_label.clone();
    let (ui, ui_rx) = ui_queue();

    let result = LoopbackSession::establish(&engine, &desk_cam(), &ui, &config).await;

    assert!(matches!(result, Err(PeerError::ConfigError(_))));
    assert_eq!(engine.connections_created(), 0);
    assert_eq!(ui_rx.pending(), 0);
}

#[tokio::test]
async fn test_failed_attachment_closes_both_connections() {
    let engine = RecordingEngine::new();
    let config = PeerPairConfig::default();
    let (ui, ui_rx) = ui_queue();
    let devices = UiKillingDevices {
        receiver: Mutex::new(Some(ui_rx)),
        inner: desk_cam(),
    };

    let result = LoopbackSession::establish(&engine, &devices, &ui, &config).await;

    assert!(matches!(result, Err(PeerError::UiError(_))));
    assert_eq!(engine.connections_created(), 2);
    for index in 0..2 {
        let connection = engine.connection(index).unwrap();
        assert_eq!(connection.count(|c| matches!(c, EngineCall::Close)), 1);
    }
}
