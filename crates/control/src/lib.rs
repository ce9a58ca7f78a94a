//! Telecommand handling.
//!
//! Frames from the link are decoded into [`Command`](camctl_protocol::Command)s
//! by the [`TelecommandHandler`] and executed by the [`Dispatcher`], which
//! owns the single active capture function.

mod dispatcher;
mod error;
mod handler;
mod power;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, PowerError};
pub use handler::TelecommandHandler;
pub use power::{PowerAction, PowerControl};
