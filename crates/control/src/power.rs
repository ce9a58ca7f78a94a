use std::fmt;

use crate::PowerError;

/// Host power transition requested by a telecommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Shutdown,
    Reboot,
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PowerAction::Shutdown => "shutdown",
            PowerAction::Reboot => "reboot",
        })
    }
}

/// Executes host power transitions.
///
/// Implementations should hand the request off rather than block; the
/// dispatcher calls this from the link receive thread.
pub trait PowerControl: Send {
    fn request(&self, action: PowerAction) -> Result<(), PowerError>;

    fn shutdown(&self) -> Result<(), PowerError> {
        self.request(PowerAction::Shutdown)
    }

    fn reboot(&self) -> Result<(), PowerError> {
        self.request(PowerAction::Reboot)
    }
}
