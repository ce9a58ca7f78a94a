//! Camera collaborator for the capture functions.
//!
//! The physical driver sits behind the [`Camera`] trait. Everything in
//! the controller talks to it through one [`CameraHandle`], which
//! serializes all camera traffic behind a single lock.

mod driver;
mod error;
mod handle;
mod simulated;

pub use driver::{Camera, ExposureSetting, ShotLocation};
pub use error::CameraError;
pub use handle::CameraHandle;
pub use simulated::{SimulatedCamera, SimulatedConfig, SimulatedProbe};
