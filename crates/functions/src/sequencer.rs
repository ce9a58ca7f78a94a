//! Back-to-back exposures.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use camctl_camera::CameraHandle;

use crate::lifecycle::{Lifecycle, micros};
use crate::{FunctionError, SequencerConfig};

/// Takes exposures one after the other, as fast as the camera allows.
///
/// Each sample is the shot's intertime: wall-clock duration of the
/// capture (and download, if enabled) minus the configured exposure.
#[derive(Debug)]
pub struct Sequencer {
    config: SequencerConfig,
    core: Arc<Lifecycle>,
}

impl Sequencer {
    pub fn new(config: SequencerConfig, camera: CameraHandle, download_folder: PathBuf) -> Self {
        tracing::debug!(?config.shots, exposure_us = config.exposure_us, "sequencer configured");
        Self {
            config,
            core: Lifecycle::new(camera, download_folder),
        }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.core
    }

    pub fn start(&self) -> Result<(), FunctionError> {
        let config = self.config;
        self.core.start("camctl-sequencer", move |core| run(core, config))
    }

    pub fn test_capture(&self) -> Result<(), FunctionError> {
        self.core.test_capture(self.config.exposure_us)
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.core.abort();
    }
}

fn run(core: &Lifecycle, config: SequencerConfig) {
    let mut taken = 0u32;

    while !core.abort_signal().is_raised() && config.shots.allows(taken) {
        let started = Instant::now();

        if let Err(e) = core.shoot(config.exposure_us) {
            tracing::error!(shot = taken + 1, error = %e, "sequencer capture failed");
            break;
        }
        taken += 1;
        core.download_if_enabled();

        let intertime = micros(started.elapsed()) - i64::from(config.exposure_us);
        let stats = core.record_sample(intertime);
        tracing::debug!(
            shot = taken,
            intertime_us = intertime,
            max_us = stats.max_us,
            "captured exposure"
        );
    }

    tracing::info!(
        shots = taken,
        aborted = core.abort_signal().is_raised(),
        "sequencer finished"
    );
}
