//! Materials, collisions and post-effects for an imported environment.
//!
//! Steps run in order: collision flags, floor material, display material
//! with its video, then the camera-bound effects. Only the last step waits
//! for the camera.

use atrium_scene::{
    EffectError, EmissiveMaterial, GlowLayer, PlaybackState, PostEffect, ReflectiveMaterial,
    SceneError, ScreenSpaceReflection, SharedScene, TextureRef, VideoPlayer, VideoSettings,
    VideoTexture,
};
use futures::channel::oneshot;

use crate::camera::CameraReady;
use crate::config::{EnvironmentConfig, MeshTarget};

#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("{role} mesh {target} not found in an environment of {meshes} meshes")]
    MissingTarget {
        role: &'static str,
        target: MeshTarget,
        meshes: usize,
    },
    #[error("camera setup ended without a camera")]
    CameraUnavailable,
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Effect(#[from] EffectError),
}

/// What wiring did to the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct WiringReport {
    pub collisions_enabled: usize,
    pub excluded: Option<usize>,
    pub floor: usize,
    pub display: usize,
    pub video: PlaybackState,
}

fn resolve(
    scene: &SharedScene,
    role: &'static str,
    target: &MeshTarget,
) -> Result<usize, WiringError> {
    let scene = scene.borrow();
    target.resolve(&scene).ok_or_else(|| WiringError::MissingTarget {
        role,
        target: target.clone(),
        meshes: scene.meshes().len(),
    })
}

/// Wire the scene's environment. Fails without touching the scene when a
/// target mesh is missing, and refuses to wire the same scene twice.
pub async fn wire_environment(
    scene: &SharedScene,
    config: &EnvironmentConfig,
    player: &dyn VideoPlayer,
    camera_ready: oneshot::Receiver<CameraReady>,
) -> Result<WiringReport, WiringError> {
    let excluded = config
        .collision_exclusion
        .as_ref()
        .map(|t| resolve(scene, "collision exclusion", t))
        .transpose()?;
    let floor = resolve(scene, "floor", &config.floor)?;
    let display = resolve(scene, "display", &config.display)?;

    let (collisions_enabled, video) = {
        let _span = tracing::info_span!("wiring").entered();
        let mut s = scene.borrow_mut();
        let asset = s.claim_wiring()?;
        let display_mesh = display;
        tracing::info!(%asset, floor, display = display_mesh, excluded = ?excluded, "wiring environment");

        let enabled = s.enable_mesh_collisions(excluded)?;

        let path = config.asset_path();
        let floor_cfg = &config.floor_material;
        let mut texture = TextureRef::new(path.sibling(&floor_cfg.texture));
        texture.invert_y = false;
        let floor_material = ReflectiveMaterial {
            name: floor_cfg.name.clone(),
            base_color: floor_cfg.base_color,
            metallic: floor_cfg.metallic,
            roughness: floor_cfg.roughness,
            reflectivity_texture: Some(texture.clone()),
            metallic_reflectance_texture: Some(texture),
        };
        let floor_id = s.add_material(floor_material);
        s.assign_material(floor, floor_id)?;

        let video_settings = VideoSettings {
            source: path.sibling(&config.video.source),
            ..config.video.clone()
        };
        let screen = EmissiveMaterial::new("display", VideoTexture::new("display-video", video_settings));
        let display_id = s.add_material(screen);
        s.assign_material(display, display_id)?;
        let video = s.start_video(display_id, player)?;

        (enabled, video)
    };

    // Effects reference the camera: wait until it is configured.
    let ready = camera_ready.await.map_err(|_| WiringError::CameraUnavailable)?;

    let _span = tracing::info_span!("wiring", camera = %ready.name).entered();
    let mut s = scene.borrow_mut();
    let ssr = {
        let camera = s.camera().ok_or(WiringError::CameraUnavailable)?;
        ScreenSpaceReflection::bind(camera, config.reflection.clone())?
    };
    let glow = GlowLayer::new(config.glow.clone())?;
    s.attach_effect(PostEffect::Reflection(ssr));
    s.attach_effect(PostEffect::Glow(glow));
    tracing::info!("environment wired");

    Ok(WiringReport {
        collisions_enabled,
        excluded,
        floor,
        display,
        video,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use atrium_assets::{AssetDecoder, AssetPath, GltfDecoder};
    use atrium_engine::{Engine, EngineOptions, HeadlessSurface};
    use atrium_scene::{
        CameraRig, LoggingVideoPlayer, Material, Scene, SceneSettings, VideoError,
    };
    use futures::executor::block_on;
    use glam::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct BrokenPlayer;

    impl VideoPlayer for BrokenPlayer {
        fn play(&self, _settings: &VideoSettings) -> Result<(), VideoError> {
            Err(VideoError::Refused("codec missing".into()))
        }
    }

    fn loaded_scene(meshes: usize) -> SharedScene {
        let mut engine =
            Engine::initialize(HeadlessSurface::new(800, 600), EngineOptions::default()).unwrap();
        let mut scene = Scene::create(&mut engine, SceneSettings::default()).unwrap();
        let asset = GltfDecoder::new()
            .decode(&AssetPath::new("./models/", "room1.glb"), &testing::room_gltf(meshes))
            .unwrap();
        scene.import_environment(asset).unwrap();
        let mut cam = CameraRig::new("camera", Vec3::new(0.0, 1.0, 10.0));
        cam.mark_configured();
        scene.set_active_camera(cam);
        Rc::new(RefCell::new(scene))
    }

    fn ready() -> oneshot::Receiver<CameraReady> {
        let (tx, rx) = oneshot::channel();
        tx.send(CameraReady {
            name: "camera".into(),
        })
        .unwrap();
        rx
    }

    #[test]
    fn wires_reference_targets() {
        let scene = loaded_scene(13);
        let report = block_on(wire_environment(
            &scene,
            &EnvironmentConfig::default(),
            &LoggingVideoPlayer,
            ready(),
        ))
        .unwrap();
        assert_eq!(report.collisions_enabled, 12);
        assert_eq!(report.excluded, Some(1));
        assert_eq!((report.floor, report.display), (12, 3));
        assert_eq!(report.video, PlaybackState::Playing);

        let s = scene.borrow();
        match s.mesh_material(12) {
            Some(Material::Reflective(m)) => {
                assert_eq!(m.roughness, 0.14);
                let tex = m.reflectivity_texture.as_ref().unwrap();
                assert_eq!(tex.path, "./models/DefaultMaterial_Roughness.png");
                assert_eq!(m.metallic_reflectance_texture.as_ref(), Some(tex));
            }
            other => panic!("floor material: {other:?}"),
        }
        assert_eq!(s.mesh(3).unwrap().position, testing::mesh_position(3));
        let kinds: Vec<_> = s.effects().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["ssr", "glow"]);
    }

    #[test]
    fn second_wiring_is_rejected() {
        let scene = loaded_scene(13);
        let config = EnvironmentConfig::default();
        block_on(wire_environment(&scene, &config, &LoggingVideoPlayer, ready())).unwrap();
        let err = block_on(wire_environment(&scene, &config, &LoggingVideoPlayer, ready()))
            .unwrap_err();
        assert!(matches!(err, WiringError::Scene(SceneError::AlreadyWired(_))));
        assert_eq!(scene.borrow().effects().len(), 2);
    }

    #[test]
    fn short_asset_fails_loudly_without_changes() {
        let scene = loaded_scene(8);
        let err = block_on(wire_environment(
            &scene,
            &EnvironmentConfig::default(),
            &LoggingVideoPlayer,
            ready(),
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            WiringError::MissingTarget { role: "floor", meshes: 8, .. }
        ));
        let s = scene.borrow();
        assert!(s.meshes().iter().all(|m| !m.check_collisions));
        assert!(s.materials().is_empty());
        assert!(!s.environment().unwrap().wired);
    }

    #[test]
    fn named_targets_win_over_index() {
        let scene = loaded_scene(13);
        let config = EnvironmentConfig {
            floor: MeshTarget::named("mesh7", 12),
            display: MeshTarget::named("no-such-mesh", 3).with_index_fallback(),
            collision_exclusion: None,
            ..EnvironmentConfig::default()
        };
        let report =
            block_on(wire_environment(&scene, &config, &LoggingVideoPlayer, ready())).unwrap();
        assert_eq!(report.floor, 7);
        assert_eq!(report.display, 3);
        assert_eq!(report.collisions_enabled, 13);
        assert!(matches!(scene.borrow().mesh_material(7), Some(Material::Reflective(_))));
    }

    #[test]
    fn missing_named_target_fails_without_fallback() {
        let scene = loaded_scene(13);
        let config = EnvironmentConfig {
            display: MeshTarget::named("Screen", 3),
            ..EnvironmentConfig::default()
        };
        let err = block_on(wire_environment(&scene, &config, &LoggingVideoPlayer, ready()))
            .unwrap_err();
        match err {
            WiringError::MissingTarget { role, target, .. } => {
                assert_eq!(role, "display");
                assert_eq!(target.name.as_deref(), Some("Screen"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let s = scene.borrow();
        assert!(s.materials().is_empty());
        assert!(!s.environment().unwrap().wired);
    }

    #[test]
    fn video_failure_does_not_fail_wiring() {
        let scene = loaded_scene(13);
        let report = block_on(wire_environment(
            &scene,
            &EnvironmentConfig::default(),
            &BrokenPlayer,
            ready(),
        ))
        .unwrap();
        assert!(matches!(report.video, PlaybackState::Unavailable(ref r) if r.contains("codec")));
        assert!(scene.borrow().has_effect("glow"));
    }

    #[test]
    fn dropped_camera_signal_skips_effects() {
        let scene = loaded_scene(13);
        let (tx, rx) = oneshot::channel::<CameraReady>();
        drop(tx);
        let err = block_on(wire_environment(
            &scene,
            &EnvironmentConfig::default(),
            &LoggingVideoPlayer,
            rx,
        ))
        .unwrap_err();
        assert!(matches!(err, WiringError::CameraUnavailable));
        assert!(scene.borrow().effects().is_empty());
    }
}
