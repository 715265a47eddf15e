use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    #[error("Connection setup error: {0}")]
    SetupError(String),
    #[error("Capture device error: {0}")]
    DeviceError(String),
    #[error("Negotiation error: {0}")]
    NegotiationError(String),
    #[error("Signaling error: {0}")]
    SignalingError(String),
    #[error("UI dispatch error: {0}")]
    UiError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Coarse failure classes used when deciding how to react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Connection creation, device open, invalid configuration.
    Setup,
    /// Creating or applying a session description.
    Negotiation,
    /// A collaborator the peer depends on is gone (paired peer, UI thread).
    Internal,
}

impl PeerError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PeerError::SetupError(_) | PeerError::DeviceError(_) | PeerError::ConfigError(_) => {
                ErrorClass::Setup
            }
            PeerError::NegotiationError(_) => ErrorClass::Negotiation,
            PeerError::SignalingError(_) | PeerError::UiError(_) => ErrorClass::Internal,
        }
    }
}
