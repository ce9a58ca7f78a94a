//! TCP link between the controller and its single ground client.
//!
//! Inbound bytes are decoded into frames and handed to a
//! [`FrameHandler`] on the receive thread. Outbound frames from any
//! thread are queued in a bounded [`RingBuffer`] and written to the
//! socket by a dedicated sender thread, so producers never block on the
//! network.

mod error;
mod outbound;
pub mod ring;
mod server;
mod writer;

pub use error::LinkError;
pub use ring::RingBuffer;
pub use server::{FrameHandler, LinkServer, ServerConfig, ServerHandle};
pub use writer::{FrameWriter, LogSink};
