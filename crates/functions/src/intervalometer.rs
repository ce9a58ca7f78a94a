//! Exposures at a fixed cadence.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use camctl_camera::CameraHandle;

use crate::lifecycle::{Lifecycle, signed_micros};
use crate::{FunctionError, IntervalometerConfig};

/// Starts one exposure every `interval`, measured from period start to
/// period start.
///
/// Each sample is the delay of the shot relative to its slot deadline:
/// negative when the shot fit in its interval, positive when it overran.
/// Overruns are reported but not corrected beyond skipping the wait.
#[derive(Debug)]
pub struct Intervalometer {
    config: IntervalometerConfig,
    core: Arc<Lifecycle>,
}

impl Intervalometer {
    pub fn new(
        config: IntervalometerConfig,
        camera: CameraHandle,
        download_folder: PathBuf,
    ) -> Self {
        tracing::debug!(
            ?config.shots,
            exposure_us = config.exposure_us,
            interval_ms = config.interval.as_millis() as u64,
            "intervalometer configured"
        );
        Self {
            config,
            core: Lifecycle::new(camera, download_folder),
        }
    }

    pub fn config(&self) -> &IntervalometerConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.core
    }

    pub fn start(&self) -> Result<(), FunctionError> {
        let config = self.config;
        self.core
            .start("camctl-intervalometer", move |core| run(core, config))
    }

    pub fn test_capture(&self) -> Result<(), FunctionError> {
        self.core.test_capture(self.config.exposure_us)
    }
}

impl Drop for Intervalometer {
    fn drop(&mut self) {
        self.core.abort();
    }
}

fn run(core: &Lifecycle, config: IntervalometerConfig) {
    let abort = core.abort_signal();
    let mut taken = 0u32;

    while !abort.is_raised() && config.shots.allows(taken) {
        let deadline = Instant::now() + config.interval;

        if let Err(e) = core.shoot(config.exposure_us) {
            tracing::error!(shot = taken + 1, error = %e, "intervalometer capture failed");
            break;
        }
        taken += 1;
        core.download_if_enabled();

        let delay = signed_micros(Instant::now(), deadline);
        if delay > 0 {
            tracing::warn!(shot = taken, delay_us = delay, "exposure overran its interval");
        }
        core.record_sample(delay);
        tracing::debug!(shot = taken, delay_us = delay, "captured exposure");

        // No wait after the final shot.
        if !config.shots.allows(taken) {
            break;
        }
        if abort.wait_until(deadline) {
            break;
        }
    }

    tracing::info!(shots = taken, aborted = abort.is_raised(), "intervalometer finished");
}
