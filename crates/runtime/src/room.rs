use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use atrium_assets::LoadProgress;
use atrium_engine::{Engine, FrameTimers, Surface};
use atrium_input::{KeyCode, PointerButton};
use atrium_scene::{Scene, SharedScene};
use futures::executor::LocalPool;

use crate::bootstrap::{Backends, BootstrapError, BootstrapHandle, BootstrapStage, launch};
use crate::config::RoomConfig;

/// An engine, its scene and the bootstrap tasks, driven one tick at a time
/// by the host.
pub struct Room<S: Surface> {
    engine: Engine<S>,
    scene: SharedScene,
    pool: LocalPool,
    timers: Option<FrameTimers>,
    bootstrap: BootstrapHandle,
}

impl<S: Surface + 'static> Room<S> {
    /// Initialize the engine on `surface`, create the scene, launch the
    /// bootstrap tasks and register the render loop.
    ///
    /// Only engine and scene creation can fail here. Environment problems
    /// show up later in `stage()`.
    pub fn start(surface: S, config: &RoomConfig, backends: Backends) -> Result<Self, BootstrapError> {
        let mut engine = Engine::initialize(surface, config.engine)?;
        let scene: SharedScene = Rc::new(RefCell::new(Scene::create(
            &mut engine,
            config.scene.clone(),
        )?));

        let pool = LocalPool::new();
        let bootstrap = launch(&pool.spawner(), scene.clone(), &backends, config)?;

        let frame_scene = scene.clone();
        engine.run_render_loop(move |ctx| {
            let (w, h) = ctx.render_size;
            let aspect = w as f32 / h.max(1) as f32;
            let frame = frame_scene.borrow_mut().advance_frame(ctx.index, aspect);
            ctx.surface.present(&frame);
        });

        Ok(Self {
            engine,
            scene,
            pool,
            timers: backends.timers,
            bootstrap,
        })
    }

    /// Fire due timers, let the bootstrap tasks run until they wait, then
    /// render one frame.
    pub fn tick(&mut self) {
        if let Some(timers) = &self.timers {
            timers.fire_due(Instant::now());
        }
        self.pool.run_until_stalled();
        self.engine.frame();
    }

    pub fn pointer_down(&mut self, button: PointerButton) {
        let action = self.scene.borrow_mut().pointer_down(button);
        if let Some(action) = action {
            tracing::debug!(?action, "pointer capture");
            self.engine.apply_pointer_action(action);
        }
    }

    pub fn key(&mut self, key: KeyCode, pressed: bool) {
        self.scene.borrow_mut().key(key, pressed);
    }

    pub fn look(&mut self, dx: f32, dy: f32) {
        self.scene.borrow_mut().look(dx, dy);
    }

    /// The surface changed size: reallocate buffers once.
    pub fn resize(&mut self) {
        self.engine.resize();
    }

    pub fn stage(&self) -> BootstrapStage {
        self.bootstrap.stage()
    }

    pub fn bootstrap(&self) -> &BootstrapHandle {
        &self.bootstrap
    }

    pub fn progress(&self) -> LoadProgress {
        self.bootstrap.progress()
    }

    pub fn engine(&self) -> &Engine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<S> {
        &mut self.engine
    }

    pub fn scene(&self) -> &SharedScene {
        &self.scene
    }

    pub fn describe(&self) -> String {
        self.scene.borrow().describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, GatedServices};
    use atrium_assets::MemorySource;
    use atrium_engine::{EngineError, HeadlessSurface};
    use atrium_input::PointerAction;
    use atrium_scene::{Material, PlaybackState};

    fn room_with(source: MemorySource) -> Room<HeadlessSurface> {
        Room::start(
            HeadlessSurface::new(800, 600),
            &RoomConfig::default(),
            Backends::headless(Rc::new(source)),
        )
        .unwrap()
    }

    #[test]
    fn surface_failure_is_fatal() {
        let result = Room::start(
            HeadlessSurface::failing("no adapter"),
            &RoomConfig::default(),
            Backends::headless(Rc::new(MemorySource::new())),
        );
        assert!(matches!(
            result,
            Err(BootstrapError::Engine(EngineError::SurfaceAcquisition(_)))
        ));
    }

    #[test]
    fn renders_at_scaled_resolution() {
        let room = room_with(testing::reference_source(13));
        assert_eq!(room.engine().render_size(), (400, 300));
        assert_eq!(room.engine().surface().buffer_size(), (400, 300));
    }

    #[test]
    fn reference_room_end_to_end() {
        let mut room = room_with(testing::reference_source(13));
        assert_eq!(room.stage(), BootstrapStage::Launching);
        room.tick();
        assert_eq!(room.stage(), BootstrapStage::Ready);

        let scene = room.scene().borrow();
        assert_eq!(scene.meshes().len(), 13);
        for (i, mesh) in scene.meshes().iter().enumerate() {
            assert_eq!(mesh.check_collisions, i != 1, "mesh {i}");
        }
        assert!(matches!(scene.mesh_material(12), Some(Material::Reflective(m)) if m.metallic == 0.5));
        match scene.mesh_material(3) {
            Some(Material::Emissive(m)) => {
                assert_eq!(m.emissive_texture.state(), &PlaybackState::Playing);
                assert_eq!(m.emissive_texture.settings.source, "./models/inertia1.mp4");
            }
            other => panic!("display material: {other:?}"),
        }
        assert_eq!(scene.mesh(3).unwrap().position, testing::mesh_position(3));
        assert!(scene.has_effect("ssr") && scene.has_effect("glow"));
    }

    #[test]
    fn frames_run_before_and_after_bootstrap() {
        let mut room = room_with(testing::reference_source(13));
        room.tick();
        let frame = room.engine().surface().last_frame().unwrap().clone();
        assert!(frame.view.is_some());
        assert_eq!(frame.post_effects, vec!["ssr", "glow"]);
        assert_eq!(room.engine().surface().frames_presented(), 1);
    }

    #[test]
    fn missing_asset_leaves_empty_scene_rendering() {
        let mut room = room_with(MemorySource::new());
        room.tick();
        room.tick();
        assert_eq!(room.stage(), BootstrapStage::Failed);
        assert!(room.bootstrap().error().unwrap().contains("room1.glb"));
        assert!(room.scene().borrow().meshes().is_empty());
        assert!(room.scene().borrow().camera().is_some());
        assert_eq!(room.engine().surface().frames_presented(), 2);
        assert_eq!(room.engine().surface().last_frame().unwrap().draw_count, 0);
    }

    #[test]
    fn resize_reallocates_once_and_keeps_rendering() {
        let mut room = room_with(testing::reference_source(13));
        room.tick();
        room.engine_mut().surface_mut().set_logical_size(1024, 768);
        room.resize();
        room.tick();
        let surface = room.engine().surface();
        assert_eq!(surface.resize_calls(), &[(512, 384)]);
        assert_eq!(surface.frames_presented(), 2);
    }

    #[test]
    fn pointer_buttons_toggle_capture() {
        let mut room = room_with(testing::reference_source(13));
        room.pointer_down(PointerButton::Primary);
        room.pointer_down(PointerButton::Primary);
        assert!(room.engine().surface().is_pointer_captured());
        room.pointer_down(PointerButton::Secondary);
        assert!(room.engine().is_pointer_captured());
        room.pointer_down(PointerButton::Middle);
        assert!(!room.engine().is_pointer_captured());
        assert_eq!(
            room.scene.borrow_mut().pointer_down(PointerButton::Middle),
            Some(PointerAction::ExitCapture)
        );
    }

    #[test]
    fn held_key_walks_camera() {
        let mut room = room_with(testing::reference_source(13));
        room.tick();
        room.scene().borrow_mut().set_collisions_enabled(false);
        room.scene().borrow_mut().camera_mut().unwrap().apply_gravity = false;
        let start = room.scene().borrow().camera().unwrap().position;

        room.key(KeyCode::W, true);
        room.tick();
        room.key(KeyCode::W, false);
        room.tick();

        let end = room.scene().borrow().camera().unwrap().position;
        // Yaw π: forward is -Z.
        assert!((end.z - (start.z - 0.1)).abs() < 1e-5);
    }

    #[test]
    fn camera_waits_on_engine_input() {
        let services = GatedServices::new();
        let mut backends = Backends::headless(Rc::new(testing::reference_source(13)));
        backends.services = Rc::new(services.clone());
        let mut room =
            Room::start(HeadlessSurface::new(800, 600), &RoomConfig::default(), backends).unwrap();

        room.tick();
        assert_eq!(room.stage(), BootstrapStage::Launching);
        assert!(room.engine().surface().last_frame().unwrap().view.is_none());
        assert_eq!(room.scene().borrow().meshes().len(), 13);
        assert!(room.scene().borrow().effects().is_empty());

        services.open();
        room.tick();
        assert_eq!(room.stage(), BootstrapStage::Ready);
    }
}
