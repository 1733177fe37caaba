//! Room bootstrap.
//!
//! A room is an engine, one scene, and two asynchronous setup tasks running
//! on a single-threaded pool: camera setup and environment loading. The
//! environment task waits for a camera-ready signal before it builds any
//! effect that references the camera, so the two tasks may interleave in any
//! order.
//!
//! # Error taxonomy
//! - Engine failures are fatal and returned from `Room::start`.
//! - Asset and wiring failures end the environment path only; the render
//!   loop keeps drawing whatever state the scene has.
//! - Video playback failures are logged and ignored.

pub mod bootstrap;
pub mod camera;
pub mod config;
pub mod environment;
mod room;
#[cfg(test)]
mod testing;
pub mod wiring;

pub use bootstrap::{Backends, BootstrapError, BootstrapHandle, BootstrapStage, launch};
pub use camera::{CameraReady, create_camera};
pub use config::{
    CameraSettings, ConfigError, EnvironmentConfig, FloorMaterial, MeshTarget, RoomConfig,
};
pub use environment::load_environment;
pub use room::Room;
pub use wiring::{WiringError, WiringReport, wire_environment};

pub fn crate_info() -> &'static str {
    "atrium-runtime v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("runtime"));
    }
}
