use thiserror::Error;

/// Errors raised by capture sessions and their collaborators.
///
/// Geometry problems met while cropping are not represented here: the
/// finishing pipeline falls back to the uncropped image instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// A device capability (camera, torch, ...) is missing.
    #[error("Capability unavailable: {0}")]
    Unavailable(String),

    /// The camera layer failed to produce a frame or a photo.
    #[error("Capture error: {0}")]
    Capture(String),

    /// The face detector failed on a frame.
    #[error("Detection error: {0}")]
    Detection(String),

    /// The shutter fired but the photo carried no decodable pixel data.
    #[error("Captured photo has no pixel data")]
    NoImageData,

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Session is not started")]
    NotStarted,

    #[error("Session is already started")]
    AlreadyStarted,

    /// The session was torn down; no capture may be triggered afterwards.
    #[error("Session is stopped")]
    Stopped,

    /// The one capture allowed for this session already happened.
    #[error("A capture was already triggered for this session")]
    AlreadyCaptured,

    /// Another session currently owns the camera.
    #[error("Another capture session is active")]
    Busy,

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CaptureError {
    pub fn unavailable(what: impl Into<String>) -> Self {
        Self::Unavailable(what.into())
    }

    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture(message.into())
    }

    pub fn detection(message: impl Into<String>) -> Self {
        Self::Detection(message.into())
    }

    /// Whether the session can keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Detection(_) | Self::InvalidGeometry(_)
        )
    }
}

impl From<tokio::task::JoinError> for CaptureError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Capture(format!("background task failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            CaptureError::unavailable("torch").to_string(),
            "Capability unavailable: torch"
        );
        assert_eq!(
            CaptureError::capture("shutter jammed").to_string(),
            "Capture error: shutter jammed"
        );
        assert!(CaptureError::Busy.to_string().contains("active"));
    }

    #[test]
    fn test_recoverable_split() {
        assert!(CaptureError::unavailable("torch").is_recoverable());
        assert!(CaptureError::detection("model").is_recoverable());
        assert!(!CaptureError::NoImageData.is_recoverable());
        assert!(!CaptureError::Stopped.is_recoverable());
    }
}
