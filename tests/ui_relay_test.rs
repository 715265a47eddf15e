//! Remote-track relay to the UI thread
//!
//! Engine notifications are raised off the UI thread; they must only ever
//! reach the surface through the queue, one message per track.

use peerpair::engine::{event_channel, EngineEvent};
use peerpair::peer::{signaling_channel, Peer, PeerSetup};
use peerpair::testing::{RecordingEngine, RecordingSurface, SurfaceCall};
use peerpair::types::{RemoteTrack, Role, TrackKind};
use peerpair::ui::{ui_queue, UiMessage, UiThread};
use peerpair::{NegotiationEngine, PeerPairConfig};
use std::time::Duration;

fn remote(id: &str, kind: TrackKind) -> RemoteTrack {
    RemoteTrack {
        id: id.to_string(),
        stream_id: "stream_id".to_string(),
        kind,
    }
}

#[tokio::test]
async fn test_video_track_queues_one_message_without_rendering() {
    let engine = RecordingEngine::new();
    let config = PeerPairConfig::default();
    let (ui, ui_rx) = ui_queue();
    let (events, events_rx) = event_channel();
    let connection = engine
        .create_connection(&config.connection, events)
        .await
        .unwrap();
    let (to_partner, _partner_inbox) = signaling_channel();
    let (_to_me, inbox) = signaling_channel();
    let peer = Peer::start(
        PeerSetup::new(Role::Responder),
        connection,
        events_rx,
        to_partner,
        inbox,
        ui,
    );

    let track = remote("video_label", TrackKind::Video);
    assert!(engine
        .connection(0)
        .unwrap()
        .emit(EngineEvent::TrackAdded(track.clone())));

    for _ in 0..100 {
        if ui_rx.pending() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(ui_rx.pending(), 1);
    assert_eq!(peer.stats().tracks_announced, 1);

    // nothing rendered until the UI side drains the queue
    let mut surface = RecordingSurface::new();
    assert!(surface.calls().is_empty());
    assert_eq!(ui_rx.dispatch_pending(&mut surface), 1);
    assert_eq!(surface.calls(), vec![SurfaceCall::StartRemoteRenderer(track)]);
}

#[test]
fn test_audio_track_is_released_without_rendering() {
    let (ui, ui_rx) = ui_queue();
    let mut surface = RecordingSurface::new();

    ui.queue_ui_callback(UiMessage::NewTrackAdded(remote(
        "audio_label",
        TrackKind::Audio,
    )))
    .unwrap();
    assert_eq!(ui_rx.dispatch_pending(&mut surface), 1);
    assert!(surface.calls().is_empty());
}

#[tokio::test]
async fn test_track_removed_does_not_reach_ui() {
    let engine = RecordingEngine::new();
    let config = PeerPairConfig::default();
    let (ui, ui_rx) = ui_queue();
    let (events, events_rx) = event_channel();
    let connection = engine
        .create_connection(&config.connection, events)
        .await
        .unwrap();
    let (to_partner, _partner_inbox) = signaling_channel();
    let (_to_me, inbox) = signaling_channel();
    let peer = Peer::start(
        PeerSetup::new(Role::Initiator),
        connection,
        events_rx,
        to_partner,
        inbox,
        ui,
    );

    peer.handle_engine_event(EngineEvent::TrackRemoved("video_label".to_string()));
    assert_eq!(ui_rx.pending(), 0);
}

#[test]
fn test_rendering_happens_on_ui_thread() {
    let surface = RecordingSurface::new();
    let probe = surface.clone();
    let (ui_thread, ui) = UiThread::spawn(move || surface).unwrap();

    let producers: Vec<_> = (0..4)
        .map(|n| {
            let ui = ui.clone();
            std::thread::spawn(move || {
                ui.queue_ui_callback(UiMessage::NewTrackAdded(remote(
                    &format!("video-{}", n),
                    TrackKind::Video,
                )))
                .unwrap();
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    assert_eq!(ui_thread.shutdown().unwrap(), 4);
    assert_eq!(probe.calls().len(), 4);

    let threads = probe.threads();
    assert!(threads.iter().all(|id| *id == threads[0]));
    assert_ne!(threads[0], std::thread::current().id());
}

#[test]
fn test_queue_after_ui_thread_shutdown_fails() {
    let (ui_thread, ui) = UiThread::spawn(RecordingSurface::new).unwrap();
    ui_thread.shutdown().unwrap();

    assert!(ui.queue_ui_callback(UiMessage::SwitchToStreamingUi).is_err());
}
