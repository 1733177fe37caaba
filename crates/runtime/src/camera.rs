use atrium_engine::Services;
use atrium_scene::{CameraRig, SharedScene};

use crate::config::CameraSettings;

/// Proof that the scene's camera finished configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraReady {
    pub name: String,
}

/// Build the first-person camera and make it the scene's active camera.
///
/// Suspends until the engine's input source is ready. Extra key bindings are
/// appended to the camera's defaults.
pub async fn create_camera(
    scene: &SharedScene,
    services: &dyn Services,
    settings: &CameraSettings,
) -> CameraReady {
    services.input_ready().await;

    let _span = tracing::info_span!("camera_setup", camera = %settings.name).entered();
    let mut rig = CameraRig::new(settings.name.clone(), settings.position);
    rig.rotation = settings.rotation;
    rig.min_z = settings.min_z;
    rig.speed = settings.speed;
    rig.apply_gravity = settings.apply_gravity;
    rig.ellipsoid = settings.ellipsoid;
    rig.check_collisions = settings.check_collisions;
    rig.keys.append(&settings.extra_keys);
    rig.attach_control();
    rig.mark_configured();

    tracing::info!(
        x = rig.position.x,
        y = rig.position.y,
        z = rig.position.z,
        "camera configured"
    );
    scene.borrow_mut().set_active_camera(rig);
    CameraReady {
        name: settings.name.clone(),
    }
}
