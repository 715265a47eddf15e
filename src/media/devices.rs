use crate::errors::PeerError;
use crate::types::CaptureDeviceInfo;
use std::any::Any;
use std::fmt;

/// Opened capture device, kept alive for as long as its track is in use.
pub struct CaptureSource {
    device: CaptureDeviceInfo,
    _backend: Option<Box<dyn Any + Send + Sync>>,
}

impl CaptureSource {
    pub fn new(device: CaptureDeviceInfo) -> Self {
        Self {
            device,
            _backend: None,
        }
    }

    /// Wrap a backend handle that must stay alive with the source.
    pub fn with_backend<B: Any + Send + Sync>(device: CaptureDeviceInfo, backend: B) -> Self {
        Self {
            device,
            _backend: Some(Box::new(backend)),
        }
    }

    pub fn device(&self) -> &CaptureDeviceInfo {
        &self.device
    }
}

impl fmt::Debug for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSource")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

/// Device/capture subsystem.
pub trait DeviceEnumerator: Send + Sync {
    fn list_devices(&self) -> Result<Vec<CaptureDeviceInfo>, PeerError>;

    fn open(&self, device: &CaptureDeviceInfo) -> Result<CaptureSource, PeerError>;
}

/// Devices reported by the operating system.
#[derive(Debug, Default, Clone)]
pub struct SystemDevices;

impl SystemDevices {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "native-capture")]
impl DeviceEnumerator for SystemDevices {
    fn list_devices(&self) -> Result<Vec<CaptureDeviceInfo>, PeerError> {
        let cameras = nokhwa::query(nokhwa::utils::ApiBackend::Auto)
            .map_err(|e| PeerError::DeviceError(format!("Failed to query cameras: {}", e)))?;

        Ok(cameras
            .into_iter()
            .map(|info| {
                CaptureDeviceInfo::new(info.index().to_string(), info.human_name())
                    .with_description(info.description().to_string())
            })
            .collect())
    }

    fn open(&self, device: &CaptureDeviceInfo) -> Result<CaptureSource, PeerError> {
        use nokhwa::pixel_format::RgbFormat;
        use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
        use nokhwa::CallbackCamera;

        let index = match device.id.parse::<u32>() {
            Ok(index) => CameraIndex::Index(index),
            Err(_) => CameraIndex::String(device.id.clone()),
        };
        let requested_format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);

        let camera = CallbackCamera::new(index, requested_format, |_| {}).map_err(|e| {
            PeerError::DeviceError(format!("Failed to open {}: {}", device.name, e))
        })?;

        Ok(CaptureSource::with_backend(
            device.clone(),
            std::sync::Mutex::new(camera),
        ))
    }
}

#[cfg(not(feature = "native-capture"))]
impl DeviceEnumerator for SystemDevices {
    fn list_devices(&self) -> Result<Vec<CaptureDeviceInfo>, PeerError> {
        log::debug!("Built without native-capture, no capture devices available");
        Ok(Vec::new())
    }

    fn open(&self, device: &CaptureDeviceInfo) -> Result<CaptureSource, PeerError> {
        Err(PeerError::DeviceError(format!(
            "Cannot open {}: built without native-capture",
            device.name
        )))
    }
}

/// Open the first usable capture device, trying `preferred` (by name) first.
pub fn open_video_capture_device(
    devices: &dyn DeviceEnumerator,
    preferred: Option<&str>,
) -> Option<CaptureSource> {
    let mut found = match devices.list_devices() {
        Ok(found) => found,
        Err(e) => {
            log::error!("Device enumeration failed: {}", e);
            return None;
        }
    };

    log::info!("Number of capture devices is {}", found.len());
    for device in &found {
        log::info!("Capture device: {} ({})", device.name, device.id);
    }

    if let Some(name) = preferred {
        if let Some(pos) = found.iter().position(|d| d.name == name) {
            let device = found.remove(pos);
            found.insert(0, device);
        } else {
            log::warn!("Preferred capture device {:?} not present", name);
        }
    }

    for device in &found {
        match devices.open(device) {
            Ok(source) => return Some(source),
            Err(e) => log::warn!("Skipping capture device {}: {}", device.name, e),
        }
    }
    None
}
