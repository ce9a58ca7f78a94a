use serde::{Deserialize, Serialize};

/// Periodic controller status, sent as a `Telemetry` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub uptime_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionReport>,
}

/// Which capture program a function runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    Sequencer,
    Intervalometer,
}

/// Forward-only lifecycle of a capture function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Idle,
    Testing,
    Started,
    Finished,
}

/// Snapshot of the active capture function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionReport {
    pub kind: FunctionKind,
    pub lifecycle: LifecycleState,
    pub download_after_exposure: bool,
    /// `-1` when unbounded.
    pub programmed_exposures: i64,
    pub exposure_time_us: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
    pub stats: TimingStats,
}

/// Aggregate of per-shot timing samples, in microseconds.
///
/// For a sequencer a sample is the intertime (wall-clock shot duration
/// minus configured exposure); for an intervalometer it is the delay
/// relative to the scheduled deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingStats {
    pub exposures_count: u32,
    pub total_us: i64,
    pub max_us: i64,
    pub last_us: i64,
    /// Samples that were positive (shot overran its slot).
    pub late_count: u32,
}

impl TimingStats {
    /// Adds one sample.
    pub fn record(&mut self, sample_us: i64) {
        if self.exposures_count == 0 || sample_us > self.max_us {
            self.max_us = sample_us;
        }
        self.last_us = sample_us;
        self.total_us = self.total_us.saturating_add(sample_us);
        self.exposures_count += 1;
        if sample_us > 0 {
            self.late_count += 1;
        }
    }

    /// Mean sample, `None` before the first exposure.
    pub fn mean(&self) -> Option<i64> {
        if self.exposures_count == 0 {
            None
        } else {
            Some(self.total_us / i64::from(self.exposures_count))
        }
    }
}
