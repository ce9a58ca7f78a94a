//! Validated parameters of the capture functions.

use std::time::Duration;

use camctl_protocol::{IntervalometerSetup, SequencerSetup};

use crate::FunctionError;

/// How many exposures a function takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotCount {
    Limited(u32),
    /// Runs until aborted.
    Unbounded,
}

impl ShotCount {
    /// Whether another shot is due after `taken` shots.
    pub fn allows(self, taken: u32) -> bool {
        match self {
            ShotCount::Limited(n) => taken < n,
            ShotCount::Unbounded => true,
        }
    }

    /// Wire representation, `-1` for unbounded.
    pub fn as_i64(self) -> i64 {
        match self {
            ShotCount::Limited(n) => i64::from(n),
            ShotCount::Unbounded => -1,
        }
    }
}

impl TryFrom<i32> for ShotCount {
    type Error = FunctionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(ShotCount::Unbounded),
            n => u32::try_from(n)
                .map(ShotCount::Limited)
                .map_err(|_| FunctionError::InvalidShotCount(n)),
        }
    }
}

fn exposure_from_wire(exposure_time_us: i32) -> Result<u32, FunctionError> {
    u32::try_from(exposure_time_us).map_err(|_| {
        FunctionError::InvalidTiming(format!("negative exposure time {exposure_time_us} us"))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerConfig {
    pub shots: ShotCount,
    pub exposure_us: u32,
}

impl TryFrom<SequencerSetup> for SequencerConfig {
    type Error = FunctionError;

    fn try_from(setup: SequencerSetup) -> Result<Self, Self::Error> {
        Ok(Self {
            shots: ShotCount::try_from(setup.num_exposures)?,
            exposure_us: exposure_from_wire(setup.exposure_time_us)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalometerConfig {
    pub shots: ShotCount,
    pub exposure_us: u32,
    /// Period from one exposure start to the next.
    pub interval: Duration,
}

impl TryFrom<IntervalometerSetup> for IntervalometerConfig {
    type Error = FunctionError;

    fn try_from(setup: IntervalometerSetup) -> Result<Self, Self::Error> {
        let interval_ms = u64::try_from(setup.interval_ms)
            .ok()
            .filter(|&ms| ms > 0)
            .ok_or_else(|| {
                FunctionError::InvalidTiming(format!(
                    "interval must be positive, got {} ms",
                    setup.interval_ms
                ))
            })?;

        Ok(Self {
            shots: ShotCount::try_from(setup.num_exposures)?,
            exposure_us: exposure_from_wire(setup.exposure_time_us)?,
            interval: Duration::from_millis(interval_ms),
        })
    }
}
