//! Local media: capture device selection and track attachment.

pub mod devices;
pub mod tracks;

pub use devices::{open_video_capture_device, CaptureSource, DeviceEnumerator, SystemDevices};
pub use tracks::{attach_tracks, AttachedTracks, Degradation};
