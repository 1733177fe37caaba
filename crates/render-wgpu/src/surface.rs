use std::sync::Arc;

use atrium_engine::{EngineOptions, RenderFrame, Surface, SurfaceError};
use winit::window::{CursorGrabMode, Window};

use crate::pipelines::{BlitPipeline, GridPipeline, OffscreenTarget};

const MSAA_SAMPLES: u32 = 4;

struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    preserve_buffer: bool,
    target: OffscreenTarget,
    grid: GridPipeline,
    blit: BlitPipeline,
    blit_bind_group: wgpu::BindGroup,
}

/// Window surface rendered through wgpu.
///
/// The GPU context is created in `acquire_context`; until then the surface
/// only knows its window.
pub struct WgpuSurface {
    window: Arc<Window>,
    gpu: Option<Gpu>,
}

impl WgpuSurface {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window, gpu: None }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    fn create_gpu(&self, options: &EngineOptions, buffer_size: (u32, u32)) -> Result<Gpu, SurfaceError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(self.window.clone())
            .map_err(|e| SurfaceError::new(format!("create surface: {e}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| SurfaceError::new("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("atrium_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| SurfaceError::new(format!("request device: {e}")))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| SurfaceError::new("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let (width, height) = self.logical_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let sample_count = if options.antialias { MSAA_SAMPLES } else { 1 };
        let target = OffscreenTarget::new(&device, format, buffer_size, sample_count);
        let grid = GridPipeline::new(&device, format, sample_count);
        let blit = BlitPipeline::new(&device, format);
        let blit_bind_group = blit.bind(&device, &target.color);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            window_width = width,
            window_height = height,
            render_width = buffer_size.0,
            render_height = buffer_size.1,
            samples = sample_count,
            "GPU surface acquired"
        );

        Ok(Gpu {
            surface,
            device,
            queue,
            config,
            sample_count,
            preserve_buffer: options.preserve_buffer,
            target,
            grid,
            blit,
            blit_bind_group,
        })
    }
}

impl Surface for WgpuSurface {
    fn logical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width.max(1), size.height.max(1))
    }

    fn acquire_context(
        &mut self,
        options: &EngineOptions,
        buffer_size: (u32, u32),
    ) -> Result<(), SurfaceError> {
        self.gpu = Some(self.create_gpu(options, buffer_size)?);
        Ok(())
    }

    fn resize_buffers(&mut self, width: u32, height: u32) {
        let (window_width, window_height) = self.logical_size();
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        gpu.config.width = window_width;
        gpu.config.height = window_height;
        gpu.surface.configure(&gpu.device, &gpu.config);
        gpu.target = OffscreenTarget::new(
            &gpu.device,
            gpu.config.format,
            (width, height),
            gpu.sample_count,
        );
        gpu.blit_bind_group = gpu.blit.bind(&gpu.device, &gpu.target.color);
    }

    fn set_pointer_capture(&mut self, captured: bool) {
        let result = if captured {
            self.window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, captured, "cursor grab not available");
        }
        self.window.set_cursor_visible(!captured);
    }

    fn present(&mut self, frame: &RenderFrame) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let window_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if let Some(view) = &frame.view {
            gpu.grid.set_view_proj(&gpu.queue, view.view_proj);
        }

        let c = frame.clear_color;
        let load = if gpu.preserve_buffer && frame.index > 0 {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(wgpu::Color {
                r: c.r as f64,
                g: c.g as f64,
                b: c.b as f64,
                a: c.a as f64,
            })
        };
        let (attachment, resolve_target) = match &gpu.target.msaa {
            Some(msaa) => (msaa, Some(&gpu.target.color)),
            None => (&gpu.target.color, None),
        };

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment,
                    resolve_target,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            if frame.view.is_some() {
                gpu.grid.draw(&mut pass);
            }
        }
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &window_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            gpu.blit.draw(&mut pass, &gpu.blit_bind_group);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        tracing::trace!(
            frame = frame.index,
            draws = frame.draw_count,
            effects = frame.post_effects.len(),
            "frame presented"
        );
    }
}
