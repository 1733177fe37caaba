use serde::{Deserialize, Serialize};

/// Rendering context configuration passed to the surface on acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub antialias: bool,
    pub preserve_buffer: bool,
    /// Multiplier applied to the logical surface size. Values below 1.0
    /// render at a lower internal resolution.
    pub hardware_scaling: f32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            antialias: false,
            preserve_buffer: false,
            hardware_scaling: 0.5,
        }
    }
}
