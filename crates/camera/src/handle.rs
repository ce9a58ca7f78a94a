use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{Camera, CameraError, ExposureSetting, ShotLocation};

/// Shared, lock-serialized access to the one camera.
///
/// Cloning is cheap. Every operation takes the same lock for its whole
/// duration, so a reconnect issued while a capture is in flight waits for
/// the capture to return.
#[derive(Clone)]
pub struct CameraHandle {
    inner: Arc<Mutex<Box<dyn Camera>>>,
}

impl std::fmt::Debug for CameraHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraHandle").finish_non_exhaustive()
    }
}

impl CameraHandle {
    pub fn new(camera: impl Camera + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(camera))),
        }
    }

    /// Exclusive access to the driver for multi-step sequences.
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn Camera>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Connects if needed and checks that the camera answers.
    pub fn ensure_ready(&self) -> Result<(), CameraError> {
        let mut camera = self.lock();
        if !camera.is_connected() {
            tracing::warn!("camera not connected, connecting");
            if let Err(e) = camera.connect() {
                tracing::error!(error = %e, "failed connecting to camera");
                return Err(e);
            }
            tracing::info!("connected to camera");
        } else if !camera.is_responsive() {
            tracing::error!("camera is not responsive");
            return Err(CameraError::Unresponsive);
        }
        Ok(())
    }

    /// Drops the session and opens a new one.
    pub fn reconnect(&self) -> Result<(), CameraError> {
        let mut camera = self.lock();
        camera.disconnect();
        camera.connect()
    }

    /// `(connected, responsive)` as reported by the driver.
    pub fn probe(&self) -> (bool, bool) {
        let mut camera = self.lock();
        let connected = camera.is_connected();
        let responsive = connected && camera.is_responsive();
        (connected, responsive)
    }

    pub fn serial_number(&self) -> Result<String, CameraError> {
        self.lock().serial_number()
    }

    /// Takes one picture of `exposure_us`.
    ///
    /// A camera in BULB mode cannot time the exposure itself, so the shot
    /// goes through the remote trigger; otherwise the camera-timed capture
    /// is used, downloading to `download_to` when given.
    pub fn shoot(
        &self,
        exposure_us: u32,
        download_to: Option<&Path>,
    ) -> Result<ShotLocation, CameraError> {
        let mut camera = self.lock();
        match camera.current_exposure_time()? {
            ExposureSetting::Bulb => {
                let shot = camera.remote_capture(exposure_us)?;
                if let Some(folder) = download_to {
                    camera.download_file(&shot, &folder.join(&shot.name))?;
                }
                Ok(shot)
            }
            ExposureSetting::Fixed(_) => camera.capture(exposure_us, download_to),
        }
    }

    /// Copies `shot` into `folder`, keeping the camera's file name.
    pub fn download(&self, shot: &ShotLocation, folder: &Path) -> Result<(), CameraError> {
        self.lock().download_file(shot, &folder.join(&shot.name))
    }

    pub fn set_config_value(&self, name: &str, value: &str) -> Result<(), CameraError> {
        self.lock().set_config_value(name, value)
    }
}
