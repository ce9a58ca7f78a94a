//! Telecommand payloads.
//!
//! A telecommand frame carries a JSON object with at least an integer
//! `cmd_id`; the remaining fields depend on the command. Decoding is
//! all-or-nothing.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::constants::{cmd_id, keys};
use crate::error::CommandError;

/// Parameters of a sequencer setup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerSetup {
    /// Number of exposures, `-1` for unbounded.
    pub num_exposures: i32,
    /// Configured exposure duration in microseconds.
    #[serde(rename = "exposure_time")]
    pub exposure_time_us: i32,
    pub download: bool,
}

/// Parameters of an intervalometer setup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalometerSetup {
    /// Number of exposures, `-1` for unbounded.
    pub num_exposures: i32,
    /// Configured exposure duration in microseconds.
    #[serde(rename = "exposure_time")]
    pub exposure_time_us: i32,
    /// Period between exposure starts in milliseconds.
    #[serde(rename = "interval")]
    pub interval_ms: i32,
    pub download: bool,
}

#[derive(Deserialize)]
struct DownloadFlag {
    download: bool,
}

/// A decoded telecommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Shutdown,
    Reboot,
    CameraTestConnection,
    CameraReconnect,
    FunctionStart,
    FunctionStop,
    FunctionTestCapture,
    DownloadAfterExposure { download: bool },
    SequencerSetup(SequencerSetup),
    IntervalometerSetup(IntervalometerSetup),
}

impl Command {
    /// Decodes a telecommand payload.
    pub fn from_json(payload: &[u8]) -> Result<Self, CommandError> {
        let value: Value = serde_json::from_slice(payload)?;
        let id = value
            .get(keys::CMD_ID)
            .and_then(Value::as_u64)
            .ok_or(CommandError::MissingId)?;

        let Ok(short_id) = u8::try_from(id) else {
            return Err(CommandError::UnknownCommand(id));
        };

        let command = match short_id {
            cmd_id::SHUTDOWN => Command::Shutdown,
            cmd_id::REBOOT => Command::Reboot,
            cmd_id::FUNCTION_START => Command::FunctionStart,
            cmd_id::FUNCTION_STOP => Command::FunctionStop,
            cmd_id::CAMERA_TEST_CONNECTION => Command::CameraTestConnection,
            cmd_id::CAMERA_RECONNECT => Command::CameraReconnect,
            cmd_id::FUNCTION_TEST_CAPTURE => Command::FunctionTestCapture,
            cmd_id::DOWNLOAD_AFTER_EXPOSURE => {
                let flag: DownloadFlag = serde_json::from_value(value)?;
                Command::DownloadAfterExposure {
                    download: flag.download,
                }
            }
            cmd_id::SEQUENCER_SETUP => Command::SequencerSetup(serde_json::from_value(value)?),
            cmd_id::INTERVALOMETER_SETUP => {
                Command::IntervalometerSetup(serde_json::from_value(value)?)
            }
            _ => return Err(CommandError::UnknownCommand(id)),
        };
        Ok(command)
    }

    /// Numeric identifier sent as `cmd_id`.
    pub fn id(&self) -> u8 {
        match self {
            Command::Shutdown => cmd_id::SHUTDOWN,
            Command::Reboot => cmd_id::REBOOT,
            Command::CameraTestConnection => cmd_id::CAMERA_TEST_CONNECTION,
            Command::CameraReconnect => cmd_id::CAMERA_RECONNECT,
            Command::FunctionStart => cmd_id::FUNCTION_START,
            Command::FunctionStop => cmd_id::FUNCTION_STOP,
            Command::FunctionTestCapture => cmd_id::FUNCTION_TEST_CAPTURE,
            Command::DownloadAfterExposure { .. } => cmd_id::DOWNLOAD_AFTER_EXPOSURE,
            Command::SequencerSetup(_) => cmd_id::SEQUENCER_SETUP,
            Command::IntervalometerSetup(_) => cmd_id::INTERVALOMETER_SETUP,
        }
    }

    /// Wire representation, as a client would send it.
    pub fn to_json(&self) -> Value {
        let id = self.id();
        match self {
            Command::DownloadAfterExposure { download } => json!({
                "cmd_id": id,
                "download": download,
            }),
            Command::SequencerSetup(s) => json!({
                "cmd_id": id,
                "num_exposures": s.num_exposures,
                "exposure_time": s.exposure_time_us,
                "download": s.download,
            }),
            Command::IntervalometerSetup(s) => json!({
                "cmd_id": id,
                "num_exposures": s.num_exposures,
                "exposure_time": s.exposure_time_us,
                "interval": s.interval_ms,
                "download": s.download,
            }),
            _ => json!({ "cmd_id": id }),
        }
    }

    /// Short human-readable name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Shutdown => "shutdown",
            Command::Reboot => "reboot",
            Command::CameraTestConnection => "camera_test_connection",
            Command::CameraReconnect => "camera_reconnect",
            Command::FunctionStart => "function_start",
            Command::FunctionStop => "function_stop",
            Command::FunctionTestCapture => "function_test_capture",
            Command::DownloadAfterExposure { .. } => "download_after_exposure",
            Command::SequencerSetup(_) => "sequencer_setup",
            Command::IntervalometerSetup(_) => "intervalometer_setup",
        }
    }
}
