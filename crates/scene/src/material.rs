use atrium_common::Color3;
use serde::{Deserialize, Serialize};

use crate::video::VideoTexture;

/// Index of a material in the scene's material table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub usize);

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "material#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureRef {
    pub path: String,
    pub u_scale: f32,
    pub v_scale: f32,
    pub no_mipmap: bool,
    pub invert_y: bool,
}

impl TextureRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            u_scale: 1.0,
            v_scale: 1.0,
            no_mipmap: false,
            invert_y: true,
        }
    }

    pub fn tiled(mut self, u: f32, v: f32) -> Self {
        self.u_scale = u;
        self.v_scale = v;
        self
    }
}

/// Metallic/roughness material with reflectance maps.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectiveMaterial {
    pub name: String,
    pub base_color: Color3,
    pub metallic: f32,
    pub roughness: f32,
    pub reflectivity_texture: Option<TextureRef>,
    pub metallic_reflectance_texture: Option<TextureRef>,
}

impl ReflectiveMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color: Color3::WHITE,
            metallic: 1.0,
            roughness: 1.0,
            reflectivity_texture: None,
            metallic_reflectance_texture: None,
        }
    }
}

/// Self-lit material whose emission comes from a video texture.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissiveMaterial {
    pub name: String,
    pub base_color: Color3,
    pub metallic: f32,
    pub emissive_color: Color3,
    pub emissive_intensity: f32,
    pub emissive_texture: VideoTexture,
}

impl EmissiveMaterial {
    /// Black, non-metallic base with full white emission from `texture`.
    pub fn new(name: impl Into<String>, texture: VideoTexture) -> Self {
        Self {
            name: name.into(),
            base_color: Color3::BLACK,
            metallic: 0.0,
            emissive_color: Color3::WHITE,
            emissive_intensity: 1.0,
            emissive_texture: texture,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Reflective(ReflectiveMaterial),
    Emissive(EmissiveMaterial),
}

impl Material {
    pub fn name(&self) -> &str {
        match self {
            Material::Reflective(m) => &m.name,
            Material::Emissive(m) => &m.name,
        }
    }

    pub fn video_mut(&mut self) -> Option<&mut VideoTexture> {
        match self {
            Material::Emissive(m) => Some(&mut m.emissive_texture),
            Material::Reflective(_) => None,
        }
    }

    pub fn video(&self) -> Option<&VideoTexture> {
        match self {
            Material::Emissive(m) => Some(&m.emissive_texture),
            Material::Reflective(_) => None,
        }
    }
}

impl From<ReflectiveMaterial> for Material {
    fn from(m: ReflectiveMaterial) -> Self {
        Material::Reflective(m)
    }
}

impl From<EmissiveMaterial> for Material {
    fn from(m: EmissiveMaterial) -> Self {
        Material::Emissive(m)
    }
}
