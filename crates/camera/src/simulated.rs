//! Stand-in driver used when no physical camera is wired in, and by tests.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use crate::{Camera, CameraError, ExposureSetting, ShotLocation};

const SHOT_FOLDER: &str = "/store_00010001/DCIM/100CAMCT";
const SERIAL: &str = "SIM-00000001";

/// Timing behaviour of the simulated body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedConfig {
    /// Extra time every capture takes on top of the exposure.
    pub capture_latency: Duration,
    /// Exposure reported while not in BULB mode.
    pub shutter_us: u32,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            capture_latency: Duration::ZERO,
            shutter_us: 1_000,
        }
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    connected: AtomicBool,
    unresponsive: AtomicBool,
    refuse_connect: AtomicBool,
    fail_captures: AtomicBool,
    connects: AtomicU32,
    disconnects: AtomicU32,
    captures: AtomicU32,
    remote_captures: AtomicU32,
    downloads: AtomicU32,
}

/// Observation and fault-injection handle onto a [`SimulatedCamera`].
///
/// Stays usable after the camera itself has been moved into a
/// [`CameraHandle`](crate::CameraHandle).
#[derive(Debug, Clone)]
pub struct SimulatedProbe {
    state: Arc<ProbeState>,
}

impl SimulatedProbe {
    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> u32 {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> u32 {
        self.state.disconnects.load(Ordering::SeqCst)
    }

    /// Camera-timed captures taken.
    pub fn captures(&self) -> u32 {
        self.state.captures.load(Ordering::SeqCst)
    }

    /// Remote-triggered captures taken.
    pub fn remote_captures(&self) -> u32 {
        self.state.remote_captures.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> u32 {
        self.state.downloads.load(Ordering::SeqCst)
    }

    /// Captures of either kind.
    pub fn shots(&self) -> u32 {
        self.captures() + self.remote_captures()
    }

    pub fn refuse_connect(&self, refuse: bool) {
        self.state.refuse_connect.store(refuse, Ordering::SeqCst);
    }

    pub fn set_responsive(&self, responsive: bool) {
        self.state.unresponsive.store(!responsive, Ordering::SeqCst);
    }

    /// Makes every following capture fail until reset.
    pub fn fail_captures(&self, fail: bool) {
        self.state.fail_captures.store(fail, Ordering::SeqCst);
    }

    /// Simulates the cable being pulled.
    pub fn unplug(&self) {
        self.state.connected.store(false, Ordering::SeqCst);
    }
}

/// Camera driver that only pretends.
///
/// Captures sleep for the requested exposure plus the configured latency
/// and number their pictures `IMG_0001.JPG`, `IMG_0002.JPG`, ...;
/// downloads write a small placeholder file.
#[derive(Debug)]
pub struct SimulatedCamera {
    config: SimulatedConfig,
    state: Arc<ProbeState>,
    bulb: bool,
    shots_taken: u32,
}

impl SimulatedCamera {
    pub fn new(config: SimulatedConfig) -> Self {
        Self {
            config,
            bulb: false,
            state: Arc::new(ProbeState::default()),
            shots_taken: 0,
        }
    }

    pub fn probe(&self) -> SimulatedProbe {
        SimulatedProbe {
            state: Arc::clone(&self.state),
        }
    }

    fn require_connected(&self) -> Result<(), CameraError> {
        if self.state.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CameraError::NotConnected)
        }
    }

    fn expose(&mut self, exposure_us: u32) -> Result<ShotLocation, CameraError> {
        self.require_connected()?;
        if self.state.fail_captures.load(Ordering::SeqCst) {
            return Err(CameraError::Capture("simulated capture failure".into()));
        }

        thread::sleep(Duration::from_micros(u64::from(exposure_us)) + self.config.capture_latency);

        self.shots_taken += 1;
        Ok(ShotLocation {
            folder: SHOT_FOLDER.into(),
            name: format!("IMG_{:04}.JPG", self.shots_taken),
        })
    }
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new(SimulatedConfig::default())
    }
}

impl Camera for SimulatedCamera {
    fn connect(&mut self) -> Result<(), CameraError> {
        if self.state.refuse_connect.load(Ordering::SeqCst) {
            return Err(CameraError::Connect("no camera detected".into()));
        }
        self.state.connected.store(true, Ordering::SeqCst);
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(serial = SERIAL, "simulated camera connected");
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.state.connected.swap(false, Ordering::SeqCst) {
            self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_connected(&mut self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    fn is_responsive(&mut self) -> bool {
        self.is_connected() && !self.state.unresponsive.load(Ordering::SeqCst)
    }

    fn serial_number(&mut self) -> Result<String, CameraError> {
        self.require_connected()?;
        Ok(SERIAL.into())
    }

    fn capture(
        &mut self,
        exposure_us: u32,
        download_to: Option<&Path>,
    ) -> Result<ShotLocation, CameraError> {
        let shot = self.expose(exposure_us)?;
        self.state.captures.fetch_add(1, Ordering::SeqCst);
        if let Some(folder) = download_to {
            self.download_file(&shot, &folder.join(&shot.name))?;
        }
        Ok(shot)
    }

    fn remote_capture(&mut self, exposure_us: u32) -> Result<ShotLocation, CameraError> {
        let shot = self.expose(exposure_us)?;
        self.state.remote_captures.fetch_add(1, Ordering::SeqCst);
        Ok(shot)
    }

    fn download_file(&mut self, shot: &ShotLocation, dest: &Path) -> Result<(), CameraError> {
        self.require_connected()?;

        let known = shot.folder == SHOT_FOLDER
            && shot
                .name
                .strip_prefix("IMG_")
                .and_then(|rest| rest.strip_suffix(".JPG"))
                .and_then(|n| n.parse::<u32>().ok())
                .is_some_and(|n| n >= 1 && n <= self.shots_taken);
        if !known {
            return Err(CameraError::Download {
                shot: shot.to_string(),
                dest: dest.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such picture on camera"),
            });
        }

        std::fs::write(dest, format!("simulated picture {shot}\n")).map_err(|source| {
            CameraError::Download {
                shot: shot.to_string(),
                dest: dest.to_path_buf(),
                source,
            }
        })?;
        self.state.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn current_exposure_time(&mut self) -> Result<ExposureSetting, CameraError> {
        self.require_connected()?;
        Ok(if self.bulb {
            ExposureSetting::Bulb
        } else {
            ExposureSetting::Fixed(self.config.shutter_us)
        })
    }

    fn set_config_value(&mut self, name: &str, value: &str) -> Result<(), CameraError> {
        if value.is_empty() {
            return Err(CameraError::Config {
                name: name.into(),
                reason: "empty value".into(),
            });
        }
        if name == "shutterspeed" {
            self.bulb = value.eq_ignore_ascii_case("bulb");
        }
        tracing::debug!(name, value, "simulated camera setting applied");
        Ok(())
    }
}
