use std::fmt::Write as _;

use atrium_assets::{AssetId, DecodedAsset, TransformNode};
use atrium_common::Color4;
use atrium_engine::{Engine, EngineError, RenderFrame, SceneToken, Surface};
use atrium_input::{InputState, KeyCode, PointerAction, PointerButton, route_pointer_down};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::CameraRig;
use crate::effects::PostEffect;
use crate::events::SceneEvent;
use crate::material::{Material, MaterialId};
use crate::mesh::{EnvironmentInfo, MaterialRef, MeshEntry};
use crate::render;
use crate::video::{PlaybackState, VideoPlayer};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("mesh index {index} out of range ({len} meshes)")]
    MeshOutOfRange { index: usize, len: usize },
    #[error("unknown {0}")]
    UnknownMaterial(MaterialId),
    #[error("scene already holds an environment")]
    EnvironmentAlreadyImported,
    #[error("scene has no environment")]
    NoEnvironment,
    #[error("environment {0} is already wired")]
    AlreadyWired(AssetId),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Per-frame gravity displacement: `constant / frame_rate` on the Y axis.
///
/// The result is a distance applied once per frame, not an acceleration.
pub fn per_frame_gravity(constant: f32, frame_rate: f32) -> Vec3 {
    Vec3::new(0.0, constant / frame_rate, 0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub light_direction: Vec3,
    pub light_intensity: f32,
    /// Units per second squared; negative pulls down.
    pub gravity_constant: f32,
    /// Frame rate the gravity constant is divided by.
    pub assumed_frame_rate: f32,
    pub clear_color: Color4,
    pub collisions_enabled: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            light_direction: Vec3::new(0.0, 1.0, 1.0),
            light_intensity: 1.5,
            gravity_constant: -9.81,
            assumed_frame_rate: 60.0,
            clear_color: Color4::OPAQUE_BLACK,
            collisions_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HemisphericLight {
    pub name: String,
    pub direction: Vec3,
    pub intensity: f32,
}

/// Mutable world state shared by the bootstrap tasks and the render loop.
pub struct Scene {
    settings: SceneSettings,
    gravity: Vec3,
    light: HemisphericLight,
    pointer_handler: fn(PointerButton) -> Option<PointerAction>,
    pointer_captured: bool,
    camera: Option<CameraRig>,
    meshes: Vec<MeshEntry>,
    transform_nodes: Vec<TransformNode>,
    environment: Option<EnvironmentInfo>,
    materials: Vec<Material>,
    effects: Vec<PostEffect>,
    input: InputState,
    events: Vec<SceneEvent>,
    _token: SceneToken,
}

impl Scene {
    /// Create the engine's scene. Fails only if the engine already has one.
    pub fn create<S: Surface>(
        engine: &mut Engine<S>,
        settings: SceneSettings,
    ) -> Result<Self, SceneError> {
        let token = engine.claim_scene()?;
        let gravity = per_frame_gravity(settings.gravity_constant, settings.assumed_frame_rate);
        let light = HemisphericLight {
            name: "light".into(),
            direction: settings.light_direction,
            intensity: settings.light_intensity,
        };
        tracing::debug!(gravity_y = gravity.y, collisions = settings.collisions_enabled, "scene created");
        Ok(Self {
            settings,
            gravity,
            light,
            pointer_handler: route_pointer_down,
            pointer_captured: false,
            camera: None,
            meshes: Vec::new(),
            transform_nodes: Vec::new(),
            environment: None,
            materials: Vec::new(),
            effects: Vec::new(),
            input: InputState::new(),
            events: Vec::new(),
            _token: token,
        })
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Change the assumed frame rate; gravity is rescaled to match.
    pub fn set_assumed_frame_rate(&mut self, frame_rate: f32) {
        self.settings.assumed_frame_rate = frame_rate;
        self.gravity = per_frame_gravity(self.settings.gravity_constant, frame_rate);
    }

    pub fn collisions_enabled(&self) -> bool {
        self.settings.collisions_enabled
    }

    pub fn set_collisions_enabled(&mut self, enabled: bool) {
        self.settings.collisions_enabled = enabled;
    }

    pub fn clear_color(&self) -> Color4 {
        self.settings.clear_color
    }

    pub fn light(&self) -> &HemisphericLight {
        &self.light
    }

    // -- pointer and keys --

    /// Route a pointer press. The returned action is for the engine to apply.
    pub fn pointer_down(&mut self, button: PointerButton) -> Option<PointerAction> {
        let action = (self.pointer_handler)(button)?;
        self.pointer_captured = action == PointerAction::EnterCapture;
        Some(action)
    }

    pub fn is_pointer_captured(&self) -> bool {
        self.pointer_captured
    }

    pub fn key(&mut self, key: KeyCode, pressed: bool) {
        self.input.set_key(key, pressed);
    }

    /// Pointer motion, ignored unless the pointer is captured.
    pub fn look(&mut self, dx: f32, dy: f32) {
        if self.pointer_captured {
            self.input.add_look(dx, dy);
        }
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    // -- camera --

    pub fn camera(&self) -> Option<&CameraRig> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut CameraRig> {
        self.camera.as_mut()
    }

    /// Make `camera` the scene's single active camera.
    pub fn set_active_camera(&mut self, camera: CameraRig) {
        tracing::info!(camera = %camera.name, "active camera set");
        self.events.push(SceneEvent::CameraAttached {
            name: camera.name.clone(),
        });
        self.camera = Some(camera);
    }

    // -- environment --

    /// Take ownership of a decoded environment. Mesh order is kept as is.
    pub fn import_environment(&mut self, asset: DecodedAsset) -> Result<EnvironmentInfo, SceneError> {
        if self.environment.is_some() {
            return Err(SceneError::EnvironmentAlreadyImported);
        }
        let info = EnvironmentInfo {
            id: asset.id,
            source: asset.source,
            mesh_count: asset.meshes.len(),
            wired: false,
        };
        self.meshes = asset.meshes.into_iter().map(MeshEntry::from).collect();
        self.transform_nodes = asset.transform_nodes;
        self.events.push(SceneEvent::EnvironmentImported {
            asset: info.id,
            meshes: self.meshes.len(),
            transform_nodes: self.transform_nodes.len(),
        });
        tracing::info!(
            asset = %info.id,
            meshes = self.meshes.len(),
            transform_nodes = self.transform_nodes.len(),
            "environment imported"
        );
        self.environment = Some(info.clone());
        Ok(info)
    }

    pub fn environment(&self) -> Option<&EnvironmentInfo> {
        self.environment.as_ref()
    }

    pub fn meshes(&self) -> &[MeshEntry] {
        &self.meshes
    }

    pub fn mesh(&self, index: usize) -> Option<&MeshEntry> {
        self.meshes.get(index)
    }

    pub fn find_mesh(&self, name: &str) -> Option<usize> {
        self.meshes.iter().position(|m| m.name == name)
    }

    pub fn transform_nodes(&self) -> &[TransformNode] {
        &self.transform_nodes
    }

    /// Turn on collision checks for every mesh except `except`. Returns how
    /// many meshes were enabled.
    pub fn enable_mesh_collisions(&mut self, except: Option<usize>) -> Result<usize, SceneError> {
        if self.environment.is_none() {
            return Err(SceneError::NoEnvironment);
        }
        if let Some(index) = except {
            self.check_mesh_index(index)?;
        }
        let mut enabled = 0;
        for (i, mesh) in self.meshes.iter_mut().enumerate() {
            if Some(i) == except {
                continue;
            }
            mesh.check_collisions = true;
            enabled += 1;
        }
        self.events.push(SceneEvent::CollisionsMarked {
            enabled,
            excluded: except,
        });
        tracing::debug!(enabled, excluded = ?except, "mesh collisions marked");
        Ok(enabled)
    }

    /// Mark the environment as wired. Fails if there is none or it was
    /// already wired.
    pub fn claim_wiring(&mut self) -> Result<AssetId, SceneError> {
        let env = self.environment.as_mut().ok_or(SceneError::NoEnvironment)?;
        if env.wired {
            return Err(SceneError::AlreadyWired(env.id));
        }
        env.wired = true;
        Ok(env.id)
    }

    // -- materials --

    pub fn add_material(&mut self, material: impl Into<Material>) -> MaterialId {
        self.materials.push(material.into());
        MaterialId(self.materials.len() - 1)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Point mesh `index` at material `id`. Placement is left untouched.
    pub fn assign_material(&mut self, index: usize, id: MaterialId) -> Result<(), SceneError> {
        self.check_mesh_index(index)?;
        let name = self
            .material(id)
            .ok_or(SceneError::UnknownMaterial(id))?
            .name()
            .to_string();
        self.meshes[index].material = Some(MaterialRef::Scene(id));
        tracing::debug!(mesh = index, material = %name, "material assigned");
        self.events.push(SceneEvent::MaterialAssigned {
            mesh: index,
            material: name,
        });
        Ok(())
    }

    /// Material currently assigned to mesh `index`, if it was created in the
    /// scene.
    pub fn mesh_material(&self, index: usize) -> Option<&Material> {
        match self.meshes.get(index)?.material.as_ref()? {
            MaterialRef::Scene(id) => self.material(*id),
            MaterialRef::Embedded(_) => None,
        }
    }

    /// Start the video behind material `id`. Playback problems are recorded,
    /// not returned.
    pub fn start_video(
        &mut self,
        id: MaterialId,
        player: &dyn VideoPlayer,
    ) -> Result<PlaybackState, SceneError> {
        let material = self
            .materials
            .get_mut(id.0)
            .ok_or(SceneError::UnknownMaterial(id))?;
        let name = material.name().to_string();
        let Some(video) = material.video_mut() else {
            return Ok(PlaybackState::Unavailable(format!("{name} has no video")));
        };
        let state = video.start(player).clone();
        self.events.push(SceneEvent::VideoPlayback {
            material: name,
            playing: state == PlaybackState::Playing,
        });
        Ok(state)
    }

    // -- effects --

    pub fn attach_effect(&mut self, effect: PostEffect) {
        let kind = effect.kind();
        self.effects.push(effect);
        self.events.push(SceneEvent::EffectAttached { kind });
        tracing::info!(effect = kind, "post effect attached");
    }

    pub fn effects(&self) -> &[PostEffect] {
        &self.effects
    }

    pub fn has_effect(&self, kind: &str) -> bool {
        self.effects.iter().any(|e| e.kind() == kind)
    }

    // -- frame --

    /// Step the camera and video textures, then describe the frame to draw.
    pub fn advance_frame(&mut self, index: u64, aspect: f32) -> RenderFrame {
        let colliders = self
            .settings
            .collisions_enabled
            .then(|| render::collider_bounds(self));
        if let Some(camera) = self.camera.as_mut() {
            camera.step(&mut self.input, self.gravity, colliders.as_deref());
        }
        for material in &mut self.materials {
            if let Some(video) = material.video_mut() {
                video.tick();
            }
        }
        render::compose_frame(self, index, aspect)
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    /// Human-readable dump of the scene.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "gravity/frame: {:.4}", self.gravity.y);
        let _ = writeln!(out, "collisions: {}", self.settings.collisions_enabled);
        match &self.camera {
            Some(cam) => {
                let _ = writeln!(
                    out,
                    "camera '{}' at ({:.2}, {:.2}, {:.2}) configured={}",
                    cam.name, cam.position.x, cam.position.y, cam.position.z,
                    cam.is_configured()
                );
            }
            None => {
                let _ = writeln!(out, "camera: none");
            }
        }
        match &self.environment {
            Some(env) => {
                let _ = writeln!(out, "environment {} from {} (wired={})", env.id, env.source, env.wired);
            }
            None => {
                let _ = writeln!(out, "environment: none");
            }
        }
        for (i, mesh) in self.meshes.iter().enumerate() {
            let material = match &mesh.material {
                Some(MaterialRef::Scene(id)) => self
                    .material(*id)
                    .map(|m| m.name().to_string())
                    .unwrap_or_default(),
                Some(MaterialRef::Embedded(name)) => format!("{name} (embedded)"),
                None => "-".into(),
            };
            let _ = writeln!(
                out,
                "  [{i:>2}] {:<24} collide={:<5} material={material}",
                mesh.name, mesh.check_collisions
            );
        }
        let kinds: Vec<&str> = self.effects.iter().map(|e| e.kind()).collect();
        let _ = writeln!(out, "effects: [{}]", kinds.join(", "));
        out
    }

    fn check_mesh_index(&self, index: usize) -> Result<(), SceneError> {
        if index >= self.meshes.len() {
            return Err(SceneError::MeshOutOfRange {
                index,
                len: self.meshes.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("meshes", &self.meshes.len())
            .field("camera", &self.camera.as_ref().map(|c| &c.name))
            .field("effects", &self.effects.len())
            .finish()
    }
}
