//! Scan session orchestration.
//!
//! Ties the capture, gating, decode, and focus layers into one lifecycle:
//! initialize binds the camera and worker pool, detections arrive as
//! [`ScanEvent`]s on a single delivery channel, and dispose tears everything
//! down without awaiting in-flight work.

pub mod command;
pub mod controller;
pub mod events;

pub use command::CommandOutcome;
pub use controller::{SessionConfig, SessionController, SessionInfo};
pub use events::ScanEvent;

use thiserror::Error;

/// Session control error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to initialize scanner: {0}")]
    Init(String),

    #[error("failed to apply scan options: {0}")]
    Options(String),

    #[error("failed to toggle flash: {0}")]
    Flash(String),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

impl SessionError {
    /// Stable wire code for the host-facing command surface.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Init(_) => "INIT_ERROR",
            SessionError::Options(_) => "OPTIONS_ERROR",
            SessionError::Flash(_) => "FLASH_ERROR",
            SessionError::InvalidArgs(_) => "INVALID_ARGS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_are_stable() {
        assert_eq!(SessionError::Init("x".into()).code(), "INIT_ERROR");
        assert_eq!(SessionError::Options("x".into()).code(), "OPTIONS_ERROR");
        assert_eq!(SessionError::Flash("x".into()).code(), "FLASH_ERROR");
        assert_eq!(SessionError::InvalidArgs("x".into()).code(), "INVALID_ARGS");
    }
}
