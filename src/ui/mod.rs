//! UI surface and the queue that feeds it
//!
//! Rendering state belongs to a single UI thread. Everything else (engine
//! callbacks, peers, track attachment) talks to the surface by queueing a
//! [`UiMessage`]; the message is handled on the UI thread by
//! [`ui_thread_callback`].

pub mod headless;
pub mod queue;

use crate::types::{LocalTrack, RemoteTrack};

pub use headless::HeadlessSurface;
pub use queue::{ui_queue, UiDispatcher, UiReceiver, UiThread};

/// Rendering surface owned by the UI thread.
pub trait UiSurface {
    fn switch_to_peer_list(&mut self, peers: &[String]);

    fn switch_to_streaming_ui(&mut self);

    fn start_local_renderer(&mut self, track: &LocalTrack);

    fn start_remote_renderer(&mut self, track: &RemoteTrack);
}

/// Work handed across to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiMessage {
    SwitchToPeerList(Vec<String>),
    SwitchToStreamingUi,
    StartLocalRenderer(LocalTrack),
    /// A track the paired side added; the UI thread owns it from here on.
    NewTrackAdded(RemoteTrack),
}

/// Handle one queued message on the UI thread.
pub fn ui_thread_callback(surface: &mut dyn UiSurface, message: UiMessage) {
    match message {
        UiMessage::SwitchToPeerList(peers) => surface.switch_to_peer_list(&peers),
        UiMessage::SwitchToStreamingUi => surface.switch_to_streaming_ui(),
        UiMessage::StartLocalRenderer(track) => surface.start_local_renderer(&track),
        UiMessage::NewTrackAdded(track) => {
            log::info!("New track on UI thread: track kind is {}", track.kind);
            if track.is_video() {
                surface.start_remote_renderer(&track);
            }
            // track released here
        }
    }
}
