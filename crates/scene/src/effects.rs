//! Post-processing effects attached to the scene.

use serde::{Deserialize, Serialize};

use crate::camera::CameraRig;

#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error("camera '{0}' has not finished configuration")]
    CameraNotConfigured(String),
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionSettings {
    /// Render target size divisor.
    pub ratio: f32,
    pub samples: u32,
    pub strength: f32,
    pub falloff_exponent: f32,
}

impl Default for ReflectionSettings {
    fn default() -> Self {
        Self {
            ratio: 2.0,
            samples: 16,
            strength: 1.0,
            falloff_exponent: 1.0,
        }
    }
}

/// Screen-space reflections, bound to one camera.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenSpaceReflection {
    pub camera: String,
    pub settings: ReflectionSettings,
}

impl ScreenSpaceReflection {
    /// Bind to `camera`. The camera must already be configured.
    pub fn bind(camera: &CameraRig, settings: ReflectionSettings) -> Result<Self, EffectError> {
        if !camera.is_configured() {
            return Err(EffectError::CameraNotConfigured(camera.name.clone()));
        }
        if settings.ratio <= 0.0 {
            return Err(EffectError::InvalidParameter {
                name: "ratio",
                value: settings.ratio,
            });
        }
        Ok(Self {
            camera: camera.name.clone(),
            settings,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlowSettings {
    pub main_texture_samples: u32,
    pub blur_kernel_size: u32,
    pub intensity: f32,
}

impl Default for GlowSettings {
    fn default() -> Self {
        Self {
            main_texture_samples: 4,
            blur_kernel_size: 256,
            intensity: 0.5,
        }
    }
}

/// Bloom around emissive surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct GlowLayer {
    pub settings: GlowSettings,
}

impl GlowLayer {
    pub fn new(settings: GlowSettings) -> Result<Self, EffectError> {
        if settings.blur_kernel_size == 0 {
            return Err(EffectError::InvalidParameter {
                name: "blur kernel size",
                value: 0.0,
            });
        }
        if settings.intensity < 0.0 {
            return Err(EffectError::InvalidParameter {
                name: "intensity",
                value: settings.intensity,
            });
        }
        Ok(Self { settings })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostEffect {
    Reflection(ScreenSpaceReflection),
    Glow(GlowLayer),
}

impl PostEffect {
    pub fn kind(&self) -> &'static str {
        match self {
            PostEffect::Reflection(_) => "ssr",
            PostEffect::Glow(_) => "glow",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn reflection_refuses_unconfigured_camera() {
        let mut cam = CameraRig::new("cam", Vec3::ZERO);
        let err = ScreenSpaceReflection::bind(&cam, ReflectionSettings::default()).unwrap_err();
        assert!(matches!(err, EffectError::CameraNotConfigured(ref n) if n == "cam"));

        cam.mark_configured();
        let ssr = ScreenSpaceReflection::bind(&cam, ReflectionSettings::default()).unwrap();
        assert_eq!(ssr.camera, "cam");
        assert_eq!(ssr.settings.samples, 16);
    }

    #[test]
    fn glow_validates() {
        let glow = GlowLayer::new(GlowSettings::default()).unwrap();
        assert_eq!(glow.settings.blur_kernel_size, 256);
        assert!(
            GlowLayer::new(GlowSettings {
                intensity: -1.0,
                ..Default::default()
            })
            .is_err()
        );
    }

    #[test]
    fn effect_kinds() {
        let glow = PostEffect::Glow(GlowLayer::new(GlowSettings::default()).unwrap());
        assert_eq!(glow.kind(), "glow");
    }
}
