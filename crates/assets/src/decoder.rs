use std::collections::HashSet;

use atrium_common::{Aabb, Transform};
use glam::{Mat4, Vec3};

use crate::error::AssetError;
use crate::path::AssetPath;
use crate::types::{AssetDecoder, AssetId, DecodedAsset, DecodedMesh, TransformNode};

/// Name of the synthetic root entry placed at mesh index 0.
pub const ROOT_MESH_NAME: &str = "__root__";

/// Scale carried by the root entry. glTF is right-handed and the scene is
/// left-handed; mirroring X equals a half turn about Y followed by negating Z.
const ROOT_SCALE: Vec3 = Vec3::new(-1.0, 1.0, 1.0);

const MAX_DEPTH: usize = 256;

/// Decoder for glTF 2.0 scene structure, in `.gltf` JSON or `.glb` binary form.
///
/// Only the node hierarchy, mesh placement, accessor bounds and material
/// names are read; vertex data stays with the rendering backend.
///
/// Mesh order: an optional synthetic root entry, then one entry per mesh
/// primitive in depth-first scene order. Multi-primitive meshes yield
/// `<name>_primitive<i>` entries.
///
/// With the root entry, every node is placed under it and so converted to
/// left-handed scene space. Without it, placements stay in glTF's own axes.
#[derive(Debug, Clone, Copy)]
pub struct GltfDecoder {
    pub root_entry: bool,
}

impl Default for GltfDecoder {
    fn default() -> Self {
        Self { root_entry: true }
    }
}

impl GltfDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder without the synthetic root entry.
    pub fn without_root() -> Self {
        Self { root_entry: false }
    }
}

impl AssetDecoder for GltfDecoder {
    fn decode(&self, path: &AssetPath, bytes: &[u8]) -> Result<DecodedAsset, AssetError> {
        let parsed = gltf::Gltf::from_slice(bytes).map_err(|e| AssetError::GltfParse(e.to_string()))?;

        let mut out = Walk {
            meshes: Vec::new(),
            nodes: Vec::new(),
        };
        let base = if self.root_entry {
            let mut root = DecodedMesh::empty(ROOT_MESH_NAME, Vec3::ZERO);
            root.scale = ROOT_SCALE;
            out.meshes.push(root);
            Mat4::from_scale(ROOT_SCALE)
        } else {
            Mat4::IDENTITY
        };
        for node in scene_roots(&parsed.document) {
            out.visit(node, base, 0)?;
        }

        tracing::debug!(
            path = %path,
            meshes = out.meshes.len(),
            transform_nodes = out.nodes.len(),
            "glTF decoded"
        );

        Ok(DecodedAsset {
            id: AssetId::of(bytes),
            source: path.clone(),
            meshes: out.meshes,
            transform_nodes: out.nodes,
        })
    }
}

/// Root nodes: the default scene's, else the first scene's, else every
/// parentless node.
fn scene_roots(document: &gltf::Document) -> Vec<gltf::Node<'_>> {
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        return scene.nodes().collect();
    }
    let children: HashSet<usize> = document
        .nodes()
        .flat_map(|n| n.children().map(|c| c.index()))
        .collect();
    document
        .nodes()
        .filter(|n| !children.contains(&n.index()))
        .collect()
}

fn vec3(value: Option<serde_json::Value>) -> Option<Vec3> {
    let value = value?;
    match value.as_array()?.as_slice() {
        [x, y, z] => Some(Vec3::new(
            x.as_f64()? as f32,
            y.as_f64()? as f32,
            z.as_f64()? as f32,
        )),
        _ => None,
    }
}

struct Walk {
    meshes: Vec<DecodedMesh>,
    nodes: Vec<TransformNode>,
}

impl Walk {
    fn visit(&mut self, node: gltf::Node<'_>, parent: Mat4, depth: usize) -> Result<(), AssetError> {
        // Cyclic hierarchies pass validation.
        if depth > MAX_DEPTH {
            return Err(AssetError::GltfParse("node hierarchy too deep".into()));
        }

        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
        let (scale, rotation, position) = world.to_scale_rotation_translation();
        let transform = Transform {
            position,
            rotation,
            scale,
        };
        let name = node
            .name()
            .map_or_else(|| format!("node_{}", node.index()), str::to_string);

        match node.mesh() {
            Some(mesh) => self.push_mesh(&name, &mesh, transform),
            None => self.nodes.push(TransformNode { name, transform }),
        }

        for child in node.children() {
            self.visit(child, world, depth + 1)?;
        }
        Ok(())
    }

    fn push_mesh(&mut self, node_name: &str, mesh: &gltf::Mesh<'_>, transform: Transform) {
        let split = mesh.primitives().len() > 1;
        for primitive in mesh.primitives() {
            let positions = primitive.get(&gltf::Semantic::Positions);
            let local_bounds = positions
                .as_ref()
                .and_then(|acc| Some(Aabb::new(vec3(acc.min())?, vec3(acc.max())?)));
            let vertex_count = positions.as_ref().map_or(0, |acc| acc.count() as u32);
            let material = primitive.material();
            let material = material.index().map(|i| {
                material
                    .name()
                    .map_or_else(|| format!("material_{i}"), str::to_string)
            });

            self.meshes.push(DecodedMesh {
                name: if split {
                    format!("{node_name}_primitive{}", primitive.index())
                } else {
                    node_name.to_string()
                },
                position: transform.position,
                rotation: transform.rotation,
                scale: transform.scale,
                local_bounds,
                vertex_count,
                material,
            });
        }
    }
}
