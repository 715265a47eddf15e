//! Testing utilities for peerpair
//!
//! In-memory stand-ins for the three external collaborators (negotiation
//! engine, capture devices, UI surface) so exchanges can be exercised
//! offline and asserted call by call.

pub mod fixtures;
pub mod recording_engine;

pub use fixtures::{RecordingSurface, StaticDevices, SurfaceCall};
pub use recording_engine::{ConnectionPlan, EngineCall, RecordingConnection, RecordingEngine};
