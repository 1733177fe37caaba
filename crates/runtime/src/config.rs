//! Room configuration, loaded from YAML. Every field has a default that
//! reproduces the reference room.

use std::path::Path;

use atrium_assets::{AssetPath, RetryPolicy};
use atrium_common::Color3;
use atrium_engine::EngineOptions;
use atrium_scene::{
    GlowSettings, KeyBindings, ReflectionSettings, Scene, SceneSettings, VideoSettings,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub engine: EngineOptions,
    pub scene: SceneSettings,
    pub camera: CameraSettings,
    pub environment: EnvironmentConfig,
    pub retry: RetryPolicy,
}

impl RoomConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub name: String,
    pub position: Vec3,
    /// Euler angles in radians; yaw π faces -Z.
    pub rotation: Vec3,
    pub min_z: f32,
    pub speed: f32,
    pub ellipsoid: Vec3,
    pub apply_gravity: bool,
    pub check_collisions: bool,
    /// Appended to the camera's default bindings.
    pub extra_keys: KeyBindings,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            name: "camera".into(),
            position: Vec3::new(0.0, 1.0, 10.0),
            rotation: Vec3::new(0.0, std::f32::consts::PI, 0.0),
            min_z: 0.25,
            speed: 0.1,
            ellipsoid: Vec3::splat(0.5),
            apply_gravity: true,
            check_collisions: true,
            extra_keys: KeyBindings::wasd(),
        }
    }
}

/// A mesh picked out of an imported environment.
///
/// Without a `name`, `index` picks the mesh. With one, the mesh of that name
/// is required: if the asset has none the target is missing, unless
/// `fallback_to_index` allows `index` to stand in for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshTarget {
    #[serde(default)]
    pub name: Option<String>,
    pub index: usize,
    #[serde(default)]
    pub fallback_to_index: bool,
}

impl MeshTarget {
    pub fn at(index: usize) -> Self {
        Self {
            name: None,
            index,
            fallback_to_index: false,
        }
    }

    /// Target the mesh called `name`; `index` is used only after
    /// `with_index_fallback`.
    pub fn named(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: Some(name.into()),
            index,
            fallback_to_index: false,
        }
    }

    pub fn with_index_fallback(mut self) -> Self {
        self.fallback_to_index = true;
        self
    }

    pub fn resolve(&self, scene: &Scene) -> Option<usize> {
        let by_name = self.name.as_deref().and_then(|n| scene.find_mesh(n));
        self.pick(by_name, scene.meshes().len())
    }

    /// Same rules as `resolve`, over a plain list of mesh names.
    pub fn resolve_among(&self, names: &[String]) -> Option<usize> {
        let by_name = self
            .name
            .as_deref()
            .and_then(|n| names.iter().position(|m| m == n));
        self.pick(by_name, names.len())
    }

    fn pick(&self, by_name: Option<usize>, len: usize) -> Option<usize> {
        let by_index = (self.index < len).then_some(self.index);
        let Some(name) = &self.name else {
            return by_index;
        };
        if by_name.is_some() {
            return by_name;
        }
        if !self.fallback_to_index {
            return None;
        }
        tracing::warn!(mesh = %name, fallback = self.index, "named mesh not found, using index");
        by_index
    }
}

impl std::fmt::Display for MeshTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) if self.fallback_to_index => write!(f, "'{name}' (or index {})", self.index),
            Some(name) => write!(f, "'{name}'"),
            None => write!(f, "index {}", self.index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorMaterial {
    pub name: String,
    pub base_color: Color3,
    pub metallic: f32,
    pub roughness: f32,
    /// Reflectance map, resolved next to the environment asset.
    pub texture: String,
}

impl Default for FloorMaterial {
    fn default() -> Self {
        Self {
            name: "floor".into(),
            base_color: Color3::WHITE,
            metallic: 0.5,
            roughness: 0.14,
            texture: "DefaultMaterial_Roughness.png".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub base: String,
    pub file: String,
    /// Used only for the progress percentage.
    pub expected_size: Option<u64>,
    pub collision_exclusion: Option<MeshTarget>,
    pub floor: MeshTarget,
    pub floor_material: FloorMaterial,
    pub display: MeshTarget,
    /// `source` is resolved next to the environment asset.
    pub video: VideoSettings,
    pub reflection: ReflectionSettings,
    pub glow: GlowSettings,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            base: "./models/".into(),
            file: "room1.glb".into(),
            expected_size: Some(209_946),
            collision_exclusion: Some(MeshTarget::at(1)),
            floor: MeshTarget::at(12),
            floor_material: FloorMaterial::default(),
            display: MeshTarget::at(3),
            video: VideoSettings {
                source: "inertia1.mp4".into(),
                ..VideoSettings::default()
            },
            reflection: ReflectionSettings::default(),
            glow: GlowSettings::default(),
        }
    }
}

impl EnvironmentConfig {
    pub fn asset_path(&self) -> AssetPath {
        AssetPath::new(self.base.clone(), self.file.clone())
    }
}
