use atrium_common::{Aabb, Transform};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AssetError;
use crate::path::AssetPath;

/// Content-addressed asset id: the first 8 bytes of the SHA-256 of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        AssetId(u64::from_le_bytes(prefix))
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// One renderable unit produced by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedMesh {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Local-space bounds from the position accessor, when the asset has them.
    pub local_bounds: Option<Aabb>,
    pub vertex_count: u32,
    /// Name of the material the asset itself assigns, if any.
    pub material: Option<String>,
}

impl DecodedMesh {
    /// A mesh entry with no geometry, placed at `position`.
    pub fn empty(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_bounds: None,
            vertex_count: 0,
            material: None,
        }
    }

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
}

/// A node of the asset hierarchy that carries no geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformNode {
    pub name: String,
    pub transform: Transform,
}

/// Decoded environment: meshes in stable order plus transform nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedAsset {
    pub id: AssetId,
    pub source: AssetPath,
    pub meshes: Vec<DecodedMesh>,
    pub transform_nodes: Vec<TransformNode>,
}

impl DecodedAsset {
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn find_mesh(&self, name: &str) -> Option<usize> {
        self.meshes.iter().position(|m| m.name == name)
    }
}

/// Turns fetched bytes into a decoded asset.
pub trait AssetDecoder {
    fn decode(&self, path: &AssetPath, bytes: &[u8]) -> Result<DecodedAsset, AssetError>;
}
