use atrium_common::Aabb;
use atrium_engine::RenderFrame;

use crate::scene::Scene;

/// Describe the scene as it should be drawn this frame.
///
/// Every part may be missing on early frames: no view until a camera is
/// active, no draws until an environment is imported, no post-effects until
/// wiring attaches them.
pub(crate) fn compose_frame(scene: &Scene, index: u64, aspect: f32) -> RenderFrame {
    RenderFrame {
        index,
        clear_color: scene.clear_color(),
        view: scene.camera().map(|cam| cam.view_state(aspect)),
        draw_count: scene.meshes().iter().filter(|m| m.is_drawable()).count(),
        post_effects: scene.effects().iter().map(|e| e.kind()).collect(),
    }
}

/// World-space boxes of meshes that opted into collision checks.
pub(crate) fn collider_bounds(scene: &Scene) -> Vec<Aabb> {
    scene
        .meshes()
        .iter()
        .filter(|m| m.check_collisions)
        .filter_map(|m| m.world_bounds())
        .collect()
}
