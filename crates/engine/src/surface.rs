use atrium_common::Color4;
use glam::{Mat4, Vec3};

use crate::options::EngineOptions;

/// Failure to obtain a rendering context from the host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("surface unavailable: {reason}")]
pub struct SurfaceError {
    pub reason: String,
}

impl SurfaceError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Camera state a frame is drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub eye: Vec3,
    pub view_proj: Mat4,
}

/// Everything the surface needs to present one frame.
///
/// `view` is `None` while the camera is still being set up; the surface
/// should present the clear color only.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub index: u64,
    pub clear_color: Color4,
    pub view: Option<ViewState>,
    pub draw_count: usize,
    pub post_effects: Vec<&'static str>,
}

/// A display surface owned by the engine.
///
/// Implemented by windowed backends and by `HeadlessSurface`.
pub trait Surface {
    /// Size of the surface in logical (unscaled) pixels.
    fn logical_size(&self) -> (u32, u32);

    /// Create the rendering context with its initial internal buffer size.
    fn acquire_context(
        &mut self,
        options: &EngineOptions,
        buffer_size: (u32, u32),
    ) -> Result<(), SurfaceError>;

    /// Reallocate internal buffers at the given internal resolution.
    fn resize_buffers(&mut self, width: u32, height: u32);

    /// Enter or leave exclusive pointer capture.
    fn set_pointer_capture(&mut self, captured: bool);

    fn present(&mut self, frame: &RenderFrame);
}

/// In-memory surface for hosts without a display.
///
/// Records every call so behavior can be inspected from the CLI and tests.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    logical: (u32, u32),
    fail_reason: Option<String>,
    acquired_with: Option<EngineOptions>,
    buffer_size: (u32, u32),
    resize_calls: Vec<(u32, u32)>,
    pointer_captured: bool,
    frames_presented: u64,
    last_frame: Option<RenderFrame>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            logical: (width, height),
            ..Self::default()
        }
    }

    /// A surface whose context acquisition always fails.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Change the logical size, as a window resize would.
    pub fn set_logical_size(&mut self, width: u32, height: u32) {
        self.logical = (width, height);
    }

    pub fn acquired_with(&self) -> Option<&EngineOptions> {
        self.acquired_with.as_ref()
    }

    pub fn buffer_size(&self) -> (u32, u32) {
        self.buffer_size
    }

    pub fn resize_calls(&self) -> &[(u32, u32)] {
        &self.resize_calls
    }

    pub fn is_pointer_captured(&self) -> bool {
        self.pointer_captured
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn last_frame(&self) -> Option<&RenderFrame> {
        self.last_frame.as_ref()
    }
}

impl Surface for HeadlessSurface {
    fn logical_size(&self) -> (u32, u32) {
        self.logical
    }

    fn acquire_context(
        &mut self,
        options: &EngineOptions,
        buffer_size: (u32, u32),
    ) -> Result<(), SurfaceError> {
        if let Some(reason) = &self.fail_reason {
            return Err(SurfaceError::new(reason.clone()));
        }
        self.acquired_with = Some(*options);
        self.buffer_size = buffer_size;
        Ok(())
    }

    fn resize_buffers(&mut self, width: u32, height: u32) {
        self.buffer_size = (width, height);
        self.resize_calls.push((width, height));
    }

    fn set_pointer_capture(&mut self, captured: bool) {
        self.pointer_captured = captured;
    }

    fn present(&mut self, frame: &RenderFrame) {
        self.frames_presented += 1;
        self.last_frame = Some(frame.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_records_acquisition() {
        let mut s = HeadlessSurface::new(800, 600);
        let options = EngineOptions::default();
        s.acquire_context(&options, (400, 300)).unwrap();
        assert_eq!(s.acquired_with(), Some(&options));
        assert_eq!(s.buffer_size(), (400, 300));
        assert!(s.resize_calls().is_empty());
    }

    #[test]
    fn failing_surface_refuses_context() {
        let mut s = HeadlessSurface::failing("no gpu");
        let err = s
            .acquire_context(&EngineOptions::default(), (1, 1))
            .unwrap_err();
        assert!(err.to_string().contains("no gpu"));
    }

    #[test]
    fn headless_keeps_last_frame() {
        let mut s = HeadlessSurface::new(10, 10);
        let frame = RenderFrame {
            index: 3,
            clear_color: Color4::OPAQUE_BLACK,
            view: None,
            draw_count: 0,
            post_effects: vec![],
        };
        s.present(&frame);
        assert_eq!(s.frames_presented(), 1);
        assert_eq!(s.last_frame().map(|f| f.index), Some(3));
    }
}
