use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use camctl_link::FrameHandler;
use camctl_protocol::{Command, Frame, FrameType};

use crate::Dispatcher;

/// Link frame handler that executes telecommands.
///
/// Only `Telecommand` frames are acted on; other frame types are logged
/// and dropped. Malformed commands are logged and dropped as a whole.
#[derive(Debug)]
pub struct TelecommandHandler {
    dispatcher: Arc<Mutex<Dispatcher>>,
    peer: Option<SocketAddr>,
}

impl TelecommandHandler {
    pub fn new(dispatcher: Arc<Mutex<Dispatcher>>) -> Self {
        Self {
            dispatcher,
            peer: None,
        }
    }

    fn dispatcher(&self) -> MutexGuard<'_, Dispatcher> {
        self.dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn handle_telecommand(&self, payload: &[u8]) {
        let command = match Command::from_json(payload) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(
                    peer = ?self.peer,
                    error = %e,
                    len = payload.len(),
                    "dropping malformed telecommand"
                );
                return;
            }
        };

        let result = self.dispatcher().dispatch(command);
        if let Err(e) = result {
            tracing::warn!(
                peer = ?self.peer,
                command = command.name(),
                error = %e,
                "telecommand not executed"
            );
        }
    }
}

impl FrameHandler for TelecommandHandler {
    fn on_frame(&mut self, frame: Frame) {
        match frame.frame_type() {
            Ok(FrameType::Telecommand) => self.handle_telecommand(&frame.payload),
            Ok(other) => {
                tracing::debug!(frame_type = ?other, len = frame.payload.len(), "ignoring inbound frame")
            }
            Err(e) => tracing::debug!(error = %e, "ignoring inbound frame"),
        }
    }

    fn on_client_connected(&mut self, peer: SocketAddr) {
        self.peer = Some(peer);
    }

    fn on_client_disconnected(&mut self) {
        self.peer = None;
    }
}
