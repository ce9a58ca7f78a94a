/// First byte of every frame header.
pub const MAGIC1: u8 = 0x54;

/// Second byte of every frame header.
pub const MAGIC2: u8 = 0xF0;

/// Magic pair + type + two length bytes.
pub const HEADER_LEN: usize = 5;

/// Largest payload a single frame can carry.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Largest encoded frame (header included).
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD_LEN + HEADER_LEN;

/// TCP port the controller listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 8888;

/// Telecommand identifiers carried in the `cmd_id` JSON field.
pub mod cmd_id {
    pub const SHUTDOWN: u8 = 1;
    pub const REBOOT: u8 = 2;

    pub const FUNCTION_START: u8 = 5;
    pub const FUNCTION_STOP: u8 = 6;

    pub const CAMERA_TEST_CONNECTION: u8 = 9;
    pub const CAMERA_RECONNECT: u8 = 10;

    pub const FUNCTION_TEST_CAPTURE: u8 = 18;
    pub const DOWNLOAD_AFTER_EXPOSURE: u8 = 19;

    pub const SEQUENCER_SETUP: u8 = 20;
    pub const INTERVALOMETER_SETUP: u8 = 30;
}

/// JSON keys used by telecommand payloads.
pub mod keys {
    pub const CMD_ID: &str = "cmd_id";
    pub const NUM_EXPOSURES: &str = "num_exposures";
    pub const EXPOSURE_TIME: &str = "exposure_time";
    pub const INTERVAL: &str = "interval";
    pub const DOWNLOAD: &str = "download";
}
