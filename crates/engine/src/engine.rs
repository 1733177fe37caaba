use atrium_input::PointerAction;

use crate::options::EngineOptions;
use crate::surface::{Surface, SurfaceError};

/// Errors from engine construction and configuration.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to acquire rendering surface: {0}")]
    SurfaceAcquisition(#[from] SurfaceError),
    #[error("invalid hardware scaling factor: {0}")]
    InvalidScaling(f32),
    #[error("engine already owns a scene")]
    SceneAlreadyCreated,
}

/// Proof that the engine handed out its single scene slot.
#[derive(Debug)]
pub struct SceneToken {
    _private: (),
}

/// Per-frame view passed to render-loop callbacks.
pub struct FrameContext<'a, S> {
    pub index: u64,
    pub render_size: (u32, u32),
    pub surface: &'a mut S,
}

pub type FrameCallback<S> = Box<dyn FnMut(&mut FrameContext<'_, S>)>;

/// Internal resolution for a logical size at a given scaling factor.
pub fn scaled_size(logical: (u32, u32), scaling: f32) -> (u32, u32) {
    let scale = |v: u32| ((v as f32 * scaling).round() as u32).max(1);
    (scale(logical.0), scale(logical.1))
}

/// Owns the rendering surface and the recurring frame callbacks.
pub struct Engine<S: Surface> {
    surface: S,
    options: EngineOptions,
    render_size: (u32, u32),
    frame_index: u64,
    render_loop: Vec<FrameCallback<S>>,
    pointer_captured: bool,
    scene_claimed: bool,
}

impl<S: Surface> Engine<S> {
    /// Bind a rendering context to `surface`.
    ///
    /// Fails if the surface cannot provide a context; this is not retried.
    pub fn initialize(mut surface: S, options: EngineOptions) -> Result<Self, EngineError> {
        validate_scaling(options.hardware_scaling)?;
        let render_size = scaled_size(surface.logical_size(), options.hardware_scaling);
        surface.acquire_context(&options, render_size)?;
        tracing::info!(
            width = render_size.0,
            height = render_size.1,
            scaling = options.hardware_scaling,
            antialias = options.antialias,
            "engine initialized"
        );
        Ok(Self {
            surface,
            options,
            render_size,
            frame_index: 0,
            render_loop: Vec::new(),
            pointer_captured: false,
            scene_claimed: false,
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn hardware_scaling(&self) -> f32 {
        self.options.hardware_scaling
    }

    /// Change the scaling factor and reallocate buffers to match.
    pub fn set_hardware_scaling(&mut self, scaling: f32) -> Result<(), EngineError> {
        validate_scaling(scaling)?;
        self.options.hardware_scaling = scaling;
        self.resize();
        Ok(())
    }

    /// Current internal buffer size.
    pub fn render_size(&self) -> (u32, u32) {
        self.render_size
    }

    /// Number of frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_index
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Hand out the engine's single scene slot.
    pub fn claim_scene(&mut self) -> Result<SceneToken, EngineError> {
        if self.scene_claimed {
            return Err(EngineError::SceneAlreadyCreated);
        }
        self.scene_claimed = true;
        Ok(SceneToken { _private: () })
    }

    /// Register a callback run once per frame, after earlier registrations.
    pub fn run_render_loop(&mut self, callback: impl FnMut(&mut FrameContext<'_, S>) + 'static) {
        self.render_loop.push(Box::new(callback));
        tracing::debug!(callbacks = self.render_loop.len(), "render loop registered");
    }

    pub fn stop_render_loop(&mut self) {
        self.render_loop.clear();
    }

    /// Run every registered frame callback once.
    pub fn frame(&mut self) {
        let mut ctx = FrameContext {
            index: self.frame_index,
            render_size: self.render_size,
            surface: &mut self.surface,
        };
        for callback in self.render_loop.iter_mut() {
            callback(&mut ctx);
        }
        self.frame_index += 1;
    }

    /// Re-read the surface size and reallocate buffers. Exactly one buffer
    /// resize per call; the render loop is untouched.
    pub fn resize(&mut self) {
        self.render_size = scaled_size(self.surface.logical_size(), self.options.hardware_scaling);
        self.surface
            .resize_buffers(self.render_size.0, self.render_size.1);
        tracing::debug!(
            width = self.render_size.0,
            height = self.render_size.1,
            "engine resized"
        );
    }

    pub fn is_pointer_captured(&self) -> bool {
        self.pointer_captured
    }

    pub fn enter_pointer_capture(&mut self) {
        self.pointer_captured = true;
        self.surface.set_pointer_capture(true);
    }

    pub fn exit_pointer_capture(&mut self) {
        self.pointer_captured = false;
        self.surface.set_pointer_capture(false);
    }

    pub fn apply_pointer_action(&mut self, action: PointerAction) {
        match action {
            PointerAction::EnterCapture => self.enter_pointer_capture(),
            PointerAction::ExitCapture => self.exit_pointer_capture(),
        }
    }
}

fn validate_scaling(scaling: f32) -> Result<(), EngineError> {
    if scaling.is_finite() && scaling > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidScaling(scaling))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine(width: u32, height: u32, scaling: f32) -> Engine<HeadlessSurface> {
        Engine::initialize(
            HeadlessSurface::new(width, height),
            EngineOptions {
                hardware_scaling: scaling,
                ..EngineOptions::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn half_scaling_halves_internal_resolution() {
        let e = engine(800, 600, 0.5);
        assert_eq!(e.render_size(), (400, 300));
        assert_eq!(e.surface().buffer_size(), (400, 300));
    }

    #[test]
    fn scaled_size_never_zero() {
        assert_eq!(scaled_size((1, 1), 0.25), (1, 1));
        assert_eq!(scaled_size((0, 0), 1.0), (1, 1));
    }

    #[test]
    fn acquisition_failure_is_fatal() {
        let result = Engine::initialize(
            HeadlessSurface::failing("canvas missing"),
            EngineOptions::default(),
        );
        assert!(matches!(result, Err(EngineError::SurfaceAcquisition(_))));
    }

    #[test]
    fn rejects_non_positive_scaling() {
        let result = Engine::initialize(
            HeadlessSurface::new(10, 10),
            EngineOptions {
                hardware_scaling: 0.0,
                ..EngineOptions::default()
            },
        );
        assert!(matches!(result, Err(EngineError::InvalidScaling(_))));
    }

    #[test]
    fn acquisition_receives_options() {
        let e = engine(100, 100, 1.0);
        let opts = e.surface().acquired_with().unwrap();
        assert!(!opts.antialias);
        assert!(!opts.preserve_buffer);
    }

    #[test]
    fn only_one_scene_per_engine() {
        let mut e = engine(10, 10, 1.0);
        assert!(e.claim_scene().is_ok());
        assert!(matches!(
            e.claim_scene(),
            Err(EngineError::SceneAlreadyCreated)
        ));
    }

    #[test]
    fn resize_issues_exactly_one_buffer_resize() {
        let mut e = engine(800, 600, 0.5);
        let ticks = Rc::new(RefCell::new(0u32));
        let counter = ticks.clone();
        e.run_render_loop(move |_ctx| *counter.borrow_mut() += 1);

        e.frame();
        e.surface_mut().set_logical_size(1024, 768);
        e.resize();
        e.frame();

        assert_eq!(e.surface().resize_calls(), &[(512, 384)]);
        assert_eq!(e.render_size(), (512, 384));
        assert_eq!(*ticks.borrow(), 2);
    }

    #[test]
    fn set_hardware_scaling_resizes() {
        let mut e = engine(800, 600, 0.5);
        e.set_hardware_scaling(1.0).unwrap();
        assert_eq!(e.render_size(), (800, 600));
        assert_eq!(e.surface().resize_calls().len(), 1);
        assert!(e.set_hardware_scaling(f32::NAN).is_err());
    }

    #[test]
    fn frame_runs_callbacks_in_registration_order() {
        let mut e = engine(10, 10, 1.0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = log.clone();
        let b = log.clone();
        e.run_render_loop(move |ctx| a.borrow_mut().push(("a", ctx.index)));
        e.run_render_loop(move |ctx| b.borrow_mut().push(("b", ctx.index)));
        e.frame();
        e.frame();
        assert_eq!(
            *log.borrow(),
            vec![("a", 0), ("b", 0), ("a", 1), ("b", 1)]
        );
        assert_eq!(e.frame_count(), 2);
    }

    #[test]
    fn pointer_capture_is_idempotent() {
        let mut e = engine(10, 10, 1.0);
        e.apply_pointer_action(PointerAction::EnterCapture);
        e.apply_pointer_action(PointerAction::EnterCapture);
        assert!(e.is_pointer_captured());
        assert!(e.surface().is_pointer_captured());
        e.apply_pointer_action(PointerAction::ExitCapture);
        e.apply_pointer_action(PointerAction::ExitCapture);
        assert!(!e.is_pointer_captured());
        assert!(!e.surface().is_pointer_captured());
    }
}
