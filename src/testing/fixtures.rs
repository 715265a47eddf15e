use crate::errors::PeerError;
use crate::media::{CaptureSource, DeviceEnumerator};
use crate::types::{CaptureDeviceInfo, LocalTrack, RemoteTrack};
use crate::ui::UiSurface;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;

/// Fixed device list with per-device open failures
#[derive(Debug, Clone, Default)]
pub struct StaticDevices {
    devices: Vec<CaptureDeviceInfo>,
    unopenable: HashSet<String>,
    list_error: Option<String>,
}

impl StaticDevices {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: Vec<CaptureDeviceInfo>) -> Self {
        Self {
            devices,
            ..Default::default()
        }
    }

    /// Enumeration itself fails.
    pub fn broken(message: &str) -> Self {
        Self {
            list_error: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_open(mut self, device_id: &str) -> Self {
        self.unopenable.insert(device_id.to_string());
        self
    }
}

impl DeviceEnumerator for StaticDevices {
    fn list_devices(&self) -> Result<Vec<CaptureDeviceInfo>, PeerError> {
        match &self.list_error {
            Some(message) => Err(PeerError::DeviceError(message.clone())),
            None => Ok(self.devices.clone()),
        }
    }

    fn open(&self, device: &CaptureDeviceInfo) -> Result<CaptureSource, PeerError> {
        if self.unopenable.contains(&device.id) {
            return Err(PeerError::DeviceError(format!(
                "{} is busy",
                device.name
            )));
        }
        Ok(CaptureSource::new(device.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    SwitchToPeerList(Vec<String>),
    SwitchToStreamingUi,
    StartLocalRenderer(LocalTrack),
    StartRemoteRenderer(RemoteTrack),
}

/// Surface that records each call and the thread it arrived on.
///
/// Clones share the same record, so a test can keep one clone while the
/// other is moved onto the UI thread.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    record: Arc<Mutex<Vec<(SurfaceCall, ThreadId)>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.record
            .lock()
            .map(|r| r.iter().map(|(call, _)| call.clone()).collect())
            .unwrap_or_default()
    }

    pub fn threads(&self) -> Vec<ThreadId> {
        self.record
            .lock()
            .map(|r| r.iter().map(|(_, thread)| *thread).collect())
            .unwrap_or_default()
    }

    fn push(&self, call: SurfaceCall) {
        if let Ok(mut record) = self.record.lock() {
            record.push((call, std::thread::current().id()));
        }
    }
}

impl UiSurface for RecordingSurface {
    fn switch_to_peer_list(&mut self, peers: &[String]) {
        self.push(SurfaceCall::SwitchToPeerList(peers.to_vec()));
    }

    fn switch_to_streaming_ui(&mut self) {
        self.push(SurfaceCall::SwitchToStreamingUi);
    }

    fn start_local_renderer(&mut self, track: &LocalTrack) {
        self.push(SurfaceCall::StartLocalRenderer(track.clone()));
    }

    fn start_remote_renderer(&mut self, track: &RemoteTrack) {
        self.push(SurfaceCall::StartRemoteRenderer(track.clone()));
    }
}
