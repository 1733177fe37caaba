use atrium_assets::{
    AssetDecoder, AssetSource, ProgressTracker, RetryPolicy, fetch_with_retry,
};
use atrium_engine::Services;
use atrium_scene::{EnvironmentInfo, SharedScene};

use crate::bootstrap::BootstrapError;
use crate::config::EnvironmentConfig;

/// Fetch, decode and import the environment asset.
///
/// Transient transfer failures are retried per `retry`, sleeping through
/// `services`. Progress goes to `progress` and is informational only.
pub async fn load_environment(
    scene: &SharedScene,
    source: &dyn AssetSource,
    decoder: &dyn AssetDecoder,
    services: &dyn Services,
    config: &EnvironmentConfig,
    retry: &RetryPolicy,
    progress: &ProgressTracker,
) -> Result<EnvironmentInfo, BootstrapError> {
    let path = config.asset_path();
    tracing::info!(path = %path, "loading environment");

    let bytes = fetch_with_retry(source, &path, progress, retry, |d| services.sleep(d)).await?;

    let _span = tracing::info_span!("environment_load", path = %path).entered();
    let asset = decoder.decode(&path, &bytes)?;
    tracing::debug!(
        bytes = bytes.len(),
        meshes = asset.mesh_count(),
        transform_nodes = asset.transform_nodes.len(),
        "environment decoded"
    );
    let info = scene.borrow_mut().import_environment(asset)?;
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use atrium_assets::{AssetError, GltfDecoder, MemorySource};
    use atrium_engine::{Engine, EngineOptions, HeadlessSurface, ImmediateServices};
    use atrium_scene::{Scene, SceneSettings};
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn shared_scene() -> SharedScene {
        let mut engine =
            Engine::initialize(HeadlessSurface::new(800, 600), EngineOptions::default()).unwrap();
        Rc::new(RefCell::new(Scene::create(&mut engine, SceneSettings::default()).unwrap()))
    }

    fn load(
        scene: &SharedScene,
        source: &MemorySource,
        progress: &ProgressTracker,
    ) -> Result<EnvironmentInfo, BootstrapError> {
        block_on(load_environment(
            scene,
            source,
            &GltfDecoder::new(),
            &ImmediateServices,
            &EnvironmentConfig::default(),
            &RetryPolicy::default(),
            progress,
        ))
    }

    #[test]
    fn imports_decoded_meshes_in_order() {
        let scene = shared_scene();
        let source = testing::reference_source(13);
        let progress = ProgressTracker::new(Some(209_946));
        let info = load(&scene, &source, &progress).unwrap();

        assert_eq!(info.mesh_count, 13);
        let s = scene.borrow();
        assert_eq!(s.mesh(0).unwrap().name, "__root__");
        assert_eq!(s.mesh(5).unwrap().name, "mesh5");
        assert!(progress.latest().loaded > 0);
    }

    #[test]
    fn transient_failures_are_retried() {
        let scene = shared_scene();
        let source = testing::reference_source(4);
        source.fail_next("./models/room1.glb", 2);
        load(&scene, &source, &ProgressTracker::default()).unwrap();
        assert_eq!(source.attempts("./models/room1.glb"), 3);
    }

    #[test]
    fn retries_are_bounded() {
        let scene = shared_scene();
        let source = testing::reference_source(4);
        source.fail_next("./models/room1.glb", 5);
        let err = load(&scene, &source, &ProgressTracker::default()).unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Asset(AssetError::Exhausted { attempts: 3, .. })
        ));
        assert!(scene.borrow().environment().is_none());
    }

    #[test]
    fn decode_failure_is_not_retried() {
        let scene = shared_scene();
        let mut source = MemorySource::new();
        source.insert("./models/room1.glb", b"not a model".to_vec());
        let err = load(&scene, &source, &ProgressTracker::default()).unwrap_err();
        assert!(matches!(err, BootstrapError::Asset(AssetError::GltfParse(_))));
        assert_eq!(source.attempts("./models/room1.glb"), 1);
    }
}
