use camctl_camera::CameraError;
use camctl_functions::FunctionError;

/// Why a telecommand was not carried out.
///
/// There is no reply channel; the error ends up in the log stream.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("cannot reconfigure while the active function is operating")]
    Busy,

    #[error("no function configured")]
    NoFunction,

    #[error("invalid setup: {0}")]
    InvalidSetup(#[source] FunctionError),

    #[error(transparent)]
    Function(#[from] FunctionError),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Power(#[from] PowerError),
}

#[derive(Debug, thiserror::Error)]
pub enum PowerError {
    #[error("power control unavailable: {0}")]
    Unavailable(String),
}
