use atrium_assets::{AssetId, AssetPath, DecodedMesh};
use atrium_common::{Aabb, Transform};
use glam::{Quat, Vec3};

use crate::material::MaterialId;

/// Which material a mesh renders with.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialRef {
    /// Material named by the imported file.
    Embedded(String),
    /// Material created in the scene.
    Scene(MaterialId),
}

/// A mesh owned by the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshEntry {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub local_bounds: Option<Aabb>,
    pub vertex_count: u32,
    pub material: Option<MaterialRef>,
    pub check_collisions: bool,
}

impl MeshEntry {
    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Axis-aligned scene-space box around the placed, rotated local bounds.
    pub fn world_bounds(&self) -> Option<Aabb> {
        let matrix = self.transform().matrix();
        self.local_bounds.map(|b| b.transformed(matrix))
    }

    /// Meshes without geometry are never drawn.
    pub fn is_drawable(&self) -> bool {
        self.vertex_count > 0
    }
}

impl From<DecodedMesh> for MeshEntry {
    fn from(m: DecodedMesh) -> Self {
        Self {
            name: m.name,
            position: m.position,
            rotation: m.rotation,
            scale: m.scale,
            local_bounds: m.local_bounds,
            vertex_count: m.vertex_count,
            material: m.material.map(MaterialRef::Embedded),
            check_collisions: false,
        }
    }
}

/// The environment currently in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentInfo {
    pub id: AssetId,
    pub source: AssetPath,
    pub mesh_count: usize,
    pub wired: bool,
}
