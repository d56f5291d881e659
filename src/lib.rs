//! Render at a fixed virtual resolution, present at any output size.
//!
//! Scene code draws into an offscreen target of a stable virtual size; the
//! compositor scales that target onto the real output surface at end of
//! frame, under a selectable aspect-ratio policy (stretch, letterbox, fill).
//!
//! The compositor talks to the GPU through the [`device::GraphicsDevice`]
//! trait; [`device::WgpuDevice`] is the production wgpu backend.

pub mod compositor;
pub mod coords;
pub mod device;
pub mod logging;

pub use compositor::{ResizePolicy, ResolutionCompositor, ScaleState};
pub use device::{Flip, GraphicsDevice, QuadParams};
