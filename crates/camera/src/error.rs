use std::io;
use std::path::PathBuf;

/// Errors reported by a camera driver.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("camera not connected")]
    NotConnected,

    #[error("camera is not responsive")]
    Unresponsive,

    #[error("failed to connect to camera: {0}")]
    Connect(String),

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("failed to download {shot} to {}: {source}", dest.display())]
    Download {
        shot: String,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to set {name}: {reason}")]
    Config { name: String, reason: String },
}
