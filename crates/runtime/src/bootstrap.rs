//! Launches camera setup and environment loading as two tasks on a
//! single-threaded pool.
//!
//! The tasks share the scene and are linked by a one-shot camera-ready
//! signal. The environment task awaits it before constructing any effect that
//! references the camera, so its completion never depends on which task the
//! pool happens to poll first.

use std::cell::RefCell;
use std::rc::Rc;

use atrium_assets::{
    AssetDecoder, AssetError, AssetSource, GltfDecoder, LoadProgress, ProgressTracker,
};
use atrium_engine::{EngineError, EngineServices, FrameTimers, ImmediateServices, Services};
use atrium_scene::{LoggingVideoPlayer, SceneError, SharedScene, VideoPlayer};
use futures::channel::oneshot;
use futures::future::RemoteHandle;
use futures::task::{LocalSpawn, LocalSpawnExt, SpawnError};

use crate::camera::create_camera;
use crate::config::RoomConfig;
use crate::environment::load_environment;
use crate::wiring::{WiringError, WiringReport, wire_environment};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("environment asset failed: {0}")]
    Asset(#[from] AssetError),
    #[error("wiring failed: {0}")]
    Wiring(#[from] WiringError),
    #[error("could not spawn bootstrap task: {0}")]
    Spawn(#[from] SpawnError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    /// Both tasks are running; nothing is guaranteed yet.
    Launching,
    /// The camera is configured; the environment may still be loading.
    CameraReady,
    /// Environment imported and wired.
    Ready,
    /// The environment path failed. The scene stays usable without it.
    Failed,
}

#[derive(Debug)]
struct StageCell {
    stage: BootstrapStage,
    error: Option<String>,
}

/// Host-side collaborators the bootstrap tasks run against.
#[derive(Clone)]
pub struct Backends {
    pub source: Rc<dyn AssetSource>,
    pub decoder: Rc<dyn AssetDecoder>,
    pub services: Rc<dyn Services>,
    pub player: Rc<dyn VideoPlayer>,
    /// Timers the room fires each tick, when `services` sleeps on them.
    pub timers: Option<FrameTimers>,
}

impl Backends {
    /// glTF decoding, no waiting, logged video.
    pub fn headless(source: Rc<dyn AssetSource>) -> Self {
        Self {
            source,
            decoder: Rc::new(GltfDecoder::new()),
            services: Rc::new(ImmediateServices),
            player: Rc::new(LoggingVideoPlayer),
            timers: None,
        }
    }

    /// Like `headless`, but retry backoff sleeps on frame timers.
    pub fn windowed(source: Rc<dyn AssetSource>, player: Rc<dyn VideoPlayer>) -> Self {
        let timers = FrameTimers::new();
        Self {
            source,
            decoder: Rc::new(GltfDecoder::new()),
            services: Rc::new(EngineServices::new(timers.clone())),
            player,
            timers: Some(timers),
        }
    }
}

/// Observes a running bootstrap.
pub struct BootstrapHandle {
    state: Rc<RefCell<StageCell>>,
    progress: ProgressTracker,
    outcome: RemoteHandle<Result<WiringReport, BootstrapError>>,
}

impl BootstrapHandle {
    pub fn stage(&self) -> BootstrapStage {
        self.state.borrow().stage
    }

    /// Message of the failure that ended the environment path, if any.
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.stage() == BootstrapStage::Ready
    }

    pub fn progress(&self) -> LoadProgress {
        self.progress.latest()
    }

    /// The environment task's result. Dropping the returned handle cancels
    /// the task.
    pub fn into_outcome(self) -> RemoteHandle<Result<WiringReport, BootstrapError>> {
        self.outcome
    }
}

impl std::fmt::Debug for BootstrapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapHandle")
            .field("stage", &self.stage())
            .field("progress", &self.progress())
            .finish()
    }
}

/// Spawn camera setup and environment loading on `spawner`.
///
/// Returns at once; the tasks run as the pool is driven.
pub fn launch<Sp: LocalSpawn + ?Sized>(
    spawner: &Sp,
    scene: SharedScene,
    backends: &Backends,
    config: &RoomConfig,
) -> Result<BootstrapHandle, BootstrapError> {
    let state = Rc::new(RefCell::new(StageCell {
        stage: BootstrapStage::Launching,
        error: None,
    }));
    let progress = ProgressTracker::new(config.environment.expected_size);
    let (camera_tx, camera_rx) = oneshot::channel();

    let camera_task = {
        let scene = scene.clone();
        let services = backends.services.clone();
        let settings = config.camera.clone();
        let state = state.clone();
        async move {
            let ready = create_camera(&scene, services.as_ref(), &settings).await;
            {
                let mut cell = state.borrow_mut();
                if cell.stage == BootstrapStage::Launching {
                    cell.stage = BootstrapStage::CameraReady;
                }
            }
            if camera_tx.send(ready).is_err() {
                tracing::debug!("environment task ended before the camera was ready");
            }
        }
    };

    let environment_task = {
        let backends = backends.clone();
        let environment = config.environment.clone();
        let retry = config.retry;
        let progress = progress.clone();
        let state = state.clone();
        async move {
            let result = async {
                load_environment(
                    &scene,
                    backends.source.as_ref(),
                    backends.decoder.as_ref(),
                    backends.services.as_ref(),
                    &environment,
                    &retry,
                    &progress,
                )
                .await?;
                let report =
                    wire_environment(&scene, &environment, backends.player.as_ref(), camera_rx)
                        .await?;
                Ok::<_, BootstrapError>(report)
            }
            .await;

            let mut cell = state.borrow_mut();
            match &result {
                Ok(report) => {
                    cell.stage = BootstrapStage::Ready;
                    tracing::info!(
                        collisions = report.collisions_enabled,
                        floor = report.floor,
                        display = report.display,
                        "room ready"
                    );
                }
                Err(e) => {
                    cell.stage = BootstrapStage::Failed;
                    cell.error = Some(e.to_string());
                    tracing::error!(error = %e, "environment bootstrap failed");
                }
            }
            result
        }
    };

    spawner.spawn_local(camera_task)?;
    let outcome = spawner.spawn_local_with_handle(environment_task)?;
    tracing::debug!("bootstrap tasks launched");

    Ok(BootstrapHandle {
        state,
        progress,
        outcome,
    })
}
