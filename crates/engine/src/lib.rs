//! Engine handle: owns the rendering surface and drives the frame loop.
//!
//! # Invariants
//! - Exactly one scene may be created per engine.
//! - Surface acquisition failure is fatal; no engine exists without a surface.
//! - Internal buffer size is the surface's logical size times the hardware
//!   scaling factor, never smaller than 1x1.
//!
//! # Workaround
//! Draw submission is out of scope. The engine hands each frame to the
//! surface as a `RenderFrame` description; `HeadlessSurface` records them so
//! hosts without a GPU (CLI, tests) can drive the same loop.

mod engine;
mod options;
mod services;
mod surface;
mod timer;

pub use engine::{Engine, EngineError, FrameCallback, FrameContext, SceneToken, scaled_size};
pub use options::EngineOptions;
pub use services::{EngineServices, ImmediateServices, Services};
pub use surface::{HeadlessSurface, RenderFrame, Surface, SurfaceError, ViewState};
pub use timer::{Delay, FrameTimers};

pub fn crate_info() -> &'static str {
    "atrium-engine v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("engine"));
    }
}
