use std::path::PathBuf;

use camctl_camera::CameraHandle;
use camctl_functions::{
    CaptureFunction, FunctionError, Intervalometer, IntervalometerConfig, Sequencer,
    SequencerConfig,
};
use camctl_protocol::{Command, FunctionReport};

use crate::{DispatchError, PowerControl};

/// Executes telecommands against the camera and the active function.
///
/// At most one capture function exists at a time. A setup command
/// replaces it only while it is not operating.
pub struct Dispatcher {
    camera: CameraHandle,
    download_folder: PathBuf,
    power: Box<dyn PowerControl>,
    active: Option<CaptureFunction>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("download_folder", &self.download_folder)
            .field("active", &self.active.as_ref().map(CaptureFunction::kind))
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        camera: CameraHandle,
        download_folder: impl Into<PathBuf>,
        power: impl PowerControl + 'static,
    ) -> Self {
        Self {
            camera,
            download_folder: download_folder.into(),
            power: Box::new(power),
            active: None,
        }
    }

    pub fn active(&self) -> Option<&CaptureFunction> {
        self.active.as_ref()
    }

    /// Status of the active function, if any.
    pub fn status(&self) -> Option<FunctionReport> {
        self.active.as_ref().map(CaptureFunction::report)
    }

    /// Carries out one telecommand.
    pub fn dispatch(&mut self, command: Command) -> Result<(), DispatchError> {
        tracing::info!(command = command.name(), "executing telecommand");

        match command {
            Command::SequencerSetup(setup) => self.replace_function(setup.download, |camera, folder| {
                let config = SequencerConfig::try_from(setup)?;
                Ok(Sequencer::new(config, camera, folder).into())
            }),
            Command::IntervalometerSetup(setup) => {
                self.replace_function(setup.download, |camera, folder| {
                    let config = IntervalometerConfig::try_from(setup)?;
                    Ok(Intervalometer::new(config, camera, folder).into())
                })
            }
            Command::FunctionStart => Ok(self.require_active()?.start()?),
            Command::FunctionStop => {
                self.require_active()?.abort();
                Ok(())
            }
            Command::FunctionTestCapture => Ok(self.require_active()?.test_capture()?),
            Command::DownloadAfterExposure { download } => {
                self.require_active()?.set_download_after_exposure(download);
                tracing::info!(download, "download after exposure set");
                Ok(())
            }
            Command::CameraReconnect => {
                self.camera.reconnect()?;
                tracing::info!("camera reconnected");
                Ok(())
            }
            Command::CameraTestConnection => {
                let (connected, responsive) = self.camera.probe();
                let serial = if connected {
                    self.camera.serial_number().ok()
                } else {
                    None
                };
                tracing::info!(
                    connected,
                    responsive,
                    serial = serial.as_deref().unwrap_or("-"),
                    "camera connection test"
                );
                Ok(())
            }
            Command::Shutdown => Ok(self.power.shutdown()?),
            Command::Reboot => Ok(self.power.reboot()?),
        }
    }

    fn require_active(&self) -> Result<&CaptureFunction, DispatchError> {
        self.active.as_ref().ok_or_else(|| {
            tracing::warn!("no function configured");
            DispatchError::NoFunction
        })
    }

    /// Builds a new function and swaps it in for the idle active one.
    ///
    /// The active function is left untouched when it is operating or when
    /// the new parameters are invalid.
    fn replace_function<F>(&mut self, download: bool, build: F) -> Result<(), DispatchError>
    where
        F: FnOnce(CameraHandle, PathBuf) -> Result<CaptureFunction, FunctionError>,
    {
        if self.active.as_ref().is_some_and(CaptureFunction::is_operating) {
            tracing::warn!("cannot set up a new function while the active one is operating");
            return Err(DispatchError::Busy);
        }

        let function = build(self.camera.clone(), self.download_folder.clone())
            .map_err(DispatchError::InvalidSetup)?;
        function.set_download_after_exposure(download);
        tracing::info!(kind = ?function.kind(), download, "function configured");

        self.active = Some(function);
        Ok(())
    }
}
