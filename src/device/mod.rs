//! Graphics device capability surface.
//!
//! This module is responsible for:
//! - the [`GraphicsDevice`] trait the compositor draws through
//! - the production wgpu backend ([`WgpuDevice`])
//! - the batched textured-quad pipeline used for compositing

mod api;
mod gpu;
mod quad;

#[cfg(test)]
pub(crate) mod mock;

pub use api::{Flip, GraphicsDevice, QuadParams};
pub use gpu::{GpuInit, GpuTarget, SurfaceErrorAction, TargetBinding, WgpuDevice};
