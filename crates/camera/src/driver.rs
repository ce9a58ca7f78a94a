use std::fmt;
use std::path::Path;

use crate::CameraError;

/// Where a captured picture lives on the camera's storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShotLocation {
    pub folder: String,
    pub name: String,
}

impl fmt::Display for ShotLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.folder.trim_end_matches('/'), self.name)
    }
}

/// Exposure mode currently dialed in on the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureSetting {
    /// No fixed duration; the shutter has to be held by an external trigger.
    Bulb,
    /// Camera-timed exposure in microseconds.
    Fixed(u32),
}

/// Capability interface of a camera driver.
///
/// Implementations talk to one physical body. Methods take `&mut self`;
/// callers share a driver through [`CameraHandle`](crate::CameraHandle).
pub trait Camera: Send {
    fn connect(&mut self) -> Result<(), CameraError>;

    fn disconnect(&mut self);

    /// Whether the same body that was connected is still attached.
    fn is_connected(&mut self) -> bool;

    /// Whether the attached body answers requests.
    fn is_responsive(&mut self) -> bool;

    /// Identifier of the attached body, for log lines.
    fn serial_number(&mut self) -> Result<String, CameraError>;

    /// Camera-timed capture, optionally downloading the picture to
    /// `download_to` (a folder) right away.
    fn capture(
        &mut self,
        exposure_us: u32,
        download_to: Option<&Path>,
    ) -> Result<ShotLocation, CameraError>;

    /// Externally triggered capture, holding the shutter for `exposure_us`.
    fn remote_capture(&mut self, exposure_us: u32) -> Result<ShotLocation, CameraError>;

    /// Copies `shot` from the camera to the file `dest`.
    fn download_file(&mut self, shot: &ShotLocation, dest: &Path) -> Result<(), CameraError>;

    fn current_exposure_time(&mut self) -> Result<ExposureSetting, CameraError>;

    fn set_config_value(&mut self, name: &str, value: &str) -> Result<(), CameraError>;
}
