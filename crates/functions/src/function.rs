use std::time::Duration;

use camctl_protocol::{FunctionKind, FunctionReport};

use crate::lifecycle::Lifecycle;
use crate::{FunctionError, Intervalometer, Sequencer};

/// The capture program currently configured on the controller.
#[derive(Debug)]
pub enum CaptureFunction {
    Sequencer(Sequencer),
    Intervalometer(Intervalometer),
}

impl From<Sequencer> for CaptureFunction {
    fn from(value: Sequencer) -> Self {
        CaptureFunction::Sequencer(value)
    }
}

impl From<Intervalometer> for CaptureFunction {
    fn from(value: Intervalometer) -> Self {
        CaptureFunction::Intervalometer(value)
    }
}

impl CaptureFunction {
    pub fn kind(&self) -> FunctionKind {
        match self {
            CaptureFunction::Sequencer(_) => FunctionKind::Sequencer,
            CaptureFunction::Intervalometer(_) => FunctionKind::Intervalometer,
        }
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        match self {
            CaptureFunction::Sequencer(f) => f.lifecycle(),
            CaptureFunction::Intervalometer(f) => f.lifecycle(),
        }
    }

    pub fn start(&self) -> Result<(), FunctionError> {
        match self {
            CaptureFunction::Sequencer(f) => f.start(),
            CaptureFunction::Intervalometer(f) => f.start(),
        }
    }

    pub fn test_capture(&self) -> Result<(), FunctionError> {
        match self {
            CaptureFunction::Sequencer(f) => f.test_capture(),
            CaptureFunction::Intervalometer(f) => f.test_capture(),
        }
    }

    pub fn abort(&self) {
        self.lifecycle().abort();
    }

    pub fn is_operating(&self) -> bool {
        self.lifecycle().is_operating()
    }

    pub fn set_download_after_exposure(&self, download: bool) {
        self.lifecycle().set_download_after_exposure(download);
    }

    pub fn wait_finished(&self, timeout: Duration) -> bool {
        self.lifecycle().wait_finished(timeout)
    }

    /// Snapshot for status telemetry.
    pub fn report(&self) -> FunctionReport {
        let (shots, exposure_us, interval) = match self {
            CaptureFunction::Sequencer(f) => (f.config().shots, f.config().exposure_us, None),
            CaptureFunction::Intervalometer(f) => (
                f.config().shots,
                f.config().exposure_us,
                Some(f.config().interval),
            ),
        };
        let lifecycle = self.lifecycle();

        FunctionReport {
            kind: self.kind(),
            lifecycle: lifecycle.lifecycle_state(),
            download_after_exposure: lifecycle.download_after_exposure(),
            programmed_exposures: shots.as_i64(),
            exposure_time_us: exposure_us,
            interval_ms: interval.map(|i| i.as_millis() as u64),
            stats: lifecycle.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use camctl_protocol::LifecycleState;

    use super::*;
    use crate::testutil::{TIMEOUT, simulated};
    use crate::{IntervalometerConfig, SequencerConfig, ShotCount};

    #[test]
    fn report_for_sequencer() {
        let (camera, _probe) = simulated(0);
        let function = CaptureFunction::from(Sequencer::new(
            SequencerConfig {
                shots: ShotCount::Limited(2),
                exposure_us: 250,
            },
            camera,
            PathBuf::from("unused"),
        ));
        function.set_download_after_exposure(true);

        let report = function.report();
        assert_eq!(report.kind, FunctionKind::Sequencer);
        assert_eq!(report.lifecycle, LifecycleState::Idle);
        assert!(report.download_after_exposure);
        assert_eq!(report.programmed_exposures, 2);
        assert_eq!(report.exposure_time_us, 250);
        assert_eq!(report.interval_ms, None);
        assert_eq!(report.stats.exposures_count, 0);
    }

    #[test]
    fn report_tracks_progress() {
        let (camera, _probe) = simulated(0);
        let function = CaptureFunction::from(Intervalometer::new(
            IntervalometerConfig {
                shots: ShotCount::Limited(2),
                exposure_us: 0,
                interval: Duration::from_millis(5),
            },
            camera,
            PathBuf::from("unused"),
        ));

        function.start().unwrap();
        assert!(function.wait_finished(TIMEOUT));
        assert!(!function.is_operating());

        let report = function.report();
        assert_eq!(report.kind, FunctionKind::Intervalometer);
        assert_eq!(report.lifecycle, LifecycleState::Finished);
        assert_eq!(report.interval_ms, Some(5));
        assert_eq!(report.stats.exposures_count, 2);
    }
}
