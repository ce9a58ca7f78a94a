use camctl_camera::CameraError;

/// Errors returned by capture function operations.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    #[error("a test capture is in progress")]
    TestInProgress,

    #[error("function is operating")]
    Operating,

    #[error("function already finished and cannot be restarted")]
    AlreadyFinished,

    #[error("no picture taken yet")]
    NoShotYet,

    #[error("invalid number of exposures: {0}")]
    InvalidShotCount(i32),

    #[error("invalid timing: {0}")]
    InvalidTiming(String),

    #[error("camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}
