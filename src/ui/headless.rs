use crate::types::{LocalTrack, RemoteTrack};
use crate::ui::UiSurface;

/// Which view the surface currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Blank,
    PeerList,
    Streaming,
}

/// Surface without a window: renders by logging.
#[derive(Debug)]
pub struct HeadlessSurface {
    view: View,
    local_renderers: Vec<String>,
    remote_renderers: Vec<String>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            view: View::Blank,
            local_renderers: Vec::new(),
            remote_renderers: Vec::new(),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn local_renderers(&self) -> &[String] {
        &self.local_renderers
    }

    pub fn remote_renderers(&self) -> &[String] {
        &self.remote_renderers
    }
}

impl UiSurface for HeadlessSurface {
    fn switch_to_peer_list(&mut self, peers: &[String]) {
        log::info!("UI: peer list ({} peers)", peers.len());
        self.view = View::PeerList;
    }

    fn switch_to_streaming_ui(&mut self) {
        log::info!("UI: streaming view");
        self.view = View::Streaming;
    }

    fn start_local_renderer(&mut self, track: &LocalTrack) {
        log::info!("UI: rendering local {} track {}", track.kind, track.id);
        self.local_renderers.push(track.id.clone());
    }

    fn start_remote_renderer(&mut self, track: &RemoteTrack) {
        log::info!(
            "UI: rendering remote {} track {} (stream {})",
            track.kind,
            track.id,
            track.stream_id
        );
        self.remote_renderers.push(track.id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrackKind;

    #[test]
    fn test_headless_surface_tracks_view_and_renderers() {
        let mut surface = HeadlessSurface::new();
        assert_eq!(surface.view(), View::Blank);

        surface.switch_to_peer_list(&[]);
        assert_eq!(surface.view(), View::PeerList);

        surface.start_local_renderer(&LocalTrack::video("video_label", "stream_id", "0"));
        surface.start_remote_renderer(&RemoteTrack {
            id: "remote_video".to_string(),
            stream_id: "stream_id".to_string(),
            kind: TrackKind::Video,
        });
        surface.switch_to_streaming_ui();

        assert_eq!(surface.view(), View::Streaming);
        assert_eq!(surface.local_renderers(), ["video_label".to_string()]);
        assert_eq!(surface.remote_renderers(), ["remote_video".to_string()]);
    }
}
