//! Geometry value types shared by the compositor and device layers.
//!
//! Canonical CPU space:
//! - Pixels, origin top-left
//! - +X right, +Y down
//!
//! Resolutions are integer ([`Extent`]); draw-call geometry is f32
//! ([`Vec2`], [`Rect`]).

mod color;
mod extent;
mod rect;
mod vec2;

pub use color::ColorRgba;
pub use extent::Extent;
pub use rect::Rect;
pub use vec2::Vec2;
