//! Scene context: the mutable world state the bootstrap tasks wire into.
//!
//! # Invariants
//! - Gravity is a per-frame displacement (constant / assumed frame rate), not
//!   a per-second acceleration.
//! - Collision checks only consider meshes whose own flag is set, and only
//!   while collisions are enabled scene-wide.
//! - A screen-space reflection effect can only be bound to a camera that has
//!   finished configuration.
//! - An imported environment is wired at most once.
//!
//! The scene is shared between bootstrap tasks as a `SharedScene`. Tasks
//! must not hold a borrow across a suspension point.

pub mod camera;
pub mod collision;
pub mod effects;
pub mod events;
pub mod material;
pub mod mesh;
mod render;
mod scene;
pub mod video;

use std::cell::RefCell;
use std::rc::Rc;

pub use camera::{CameraRig, KeyBindings};
pub use effects::{
    EffectError, GlowLayer, GlowSettings, PostEffect, ReflectionSettings, ScreenSpaceReflection,
};
pub use events::SceneEvent;
pub use material::{EmissiveMaterial, Material, MaterialId, ReflectiveMaterial, TextureRef};
pub use mesh::{EnvironmentInfo, MaterialRef, MeshEntry};
pub use scene::{HemisphericLight, Scene, SceneError, SceneSettings, per_frame_gravity};
pub use video::{
    LoggingVideoPlayer, PlaybackState, Sampling, VideoError, VideoPlayer, VideoSettings,
    VideoTexture,
};

/// Scene handle shared by the render loop and bootstrap tasks.
pub type SharedScene = Rc<RefCell<Scene>>;

pub fn crate_info() -> &'static str {
    "atrium-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}
