//! Capture functions.
//!
//! A capture function runs a program of exposures on its own thread:
//! the [`Sequencer`] shoots back to back, the [`Intervalometer`] shoots
//! at a fixed cadence. Both share the [`Lifecycle`] that tracks their
//! state, statistics and abort signal.

mod config;
mod error;
mod function;
mod intervalometer;
mod lifecycle;
mod sequencer;

pub use config::{IntervalometerConfig, SequencerConfig, ShotCount};
pub use error::FunctionError;
pub use function::CaptureFunction;
pub use intervalometer::Intervalometer;
pub use lifecycle::Lifecycle;
pub use sequencer::Sequencer;
