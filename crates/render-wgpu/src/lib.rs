//! wgpu backend for the engine's `Surface`.
//!
//! Frames are drawn into an offscreen target at the engine's internal
//! resolution and then stretched onto the window, so hardware scaling below
//! 1.0 renders fewer pixels than the window shows.
//!
//! # Invariants
//! - The offscreen target is only reallocated from `resize_buffers`.
//! - Frames without a view present the clear color only.

mod pipelines;
mod shaders;
mod surface;

pub use surface::WgpuSurface;
