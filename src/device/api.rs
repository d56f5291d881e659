use crate::coords::{ColorRgba, Extent, Rect, Vec2};

/// Mirroring applied to a quad's source texture.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl Flip {
    #[inline]
    pub fn flips_x(self) -> bool {
        matches!(self, Flip::Horizontal | Flip::Both)
    }

    #[inline]
    pub fn flips_y(self) -> bool {
        matches!(self, Flip::Vertical | Flip::Both)
    }
}

/// Parameters for a single textured quad draw.
///
/// The quad covers `source` (or the whole texture) and is placed so that
/// `origin` — a point in source pixels — lands on `position` in destination
/// pixels. Scaling and rotation are anchored at `origin`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuadParams {
    /// Destination position, in pixels of the bound target.
    pub position: Vec2,
    /// Region of the texture to draw; `None` draws the whole texture.
    pub source: Option<Rect>,
    /// Color the sampled texel is multiplied by.
    pub tint: ColorRgba,
    /// Rotation around `origin`, radians, clockwise.
    pub rotation: f32,
    /// Anchor point, in source pixels.
    pub origin: Vec2,
    /// Per-axis scale applied around `origin`.
    pub scale: Vec2,
    pub flip: Flip,
    /// Layer hint; backends without a depth buffer draw in submission order.
    pub depth: f32,
}

impl Default for QuadParams {
    fn default() -> Self {
        Self {
            position: Vec2::zero(),
            source: None,
            tint: ColorRgba::white(),
            rotation: 0.0,
            origin: Vec2::zero(),
            scale: Vec2::splat(1.0),
            flip: Flip::None,
            depth: 0.0,
        }
    }
}

/// Minimal rendering capability the compositor needs from a host.
///
/// The trait models render-target binding as an explicit request/response
/// pair: [`bind_target`](GraphicsDevice::bind_target) returns the binding
/// that was active before, as a value the caller later hands back to
/// [`restore_bindings`](GraphicsDevice::restore_bindings). Ownership of
/// "what to restore" is therefore explicit rather than hidden device state,
/// and the whole surface can be implemented by a deterministic fake.
///
/// All operations are single-threaded-affine, as is usual for real-time
/// graphics APIs.
pub trait GraphicsDevice {
    /// An owned offscreen render target, usable as a texture once drawn to.
    type Target;
    /// Opaque snapshot of the currently bound render target(s).
    type BindingSet;

    /// Current output surface size in pixels.
    fn output_size(&self) -> Extent;

    /// Allocates a render target of the given pixel size.
    fn create_target(&mut self, size: Extent) -> Self::Target;

    /// Makes `target` the current render target; returns the previous binding.
    fn bind_target(&mut self, target: &Self::Target) -> Self::BindingSet;

    /// Restores a binding previously returned by `bind_target`.
    fn restore_bindings(&mut self, bindings: Self::BindingSet);

    /// Clears the currently bound target to `color`.
    fn clear(&mut self, color: ColorRgba);

    /// Opens a quad batch. Draws are submitted on `end_quads`.
    fn begin_quads(&mut self);

    /// Records one textured quad onto the currently bound target.
    fn draw_quad(&mut self, texture: &Self::Target, params: QuadParams);

    /// Closes the current quad batch and submits its draws.
    fn end_quads(&mut self);
}
