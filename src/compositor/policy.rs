use crate::coords::{Extent, Vec2};

/// How a virtual-resolution image is fitted onto a differently-sized output.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ResizePolicy {
    /// Scale each axis independently so the image exactly fills the output.
    /// Does not preserve aspect ratio.
    #[default]
    Stretch,
    /// Uniform scale by the smaller per-axis ratio. Preserves aspect ratio;
    /// the remaining space shows as bars on one axis.
    Letterbox,
    /// Uniform scale by the larger per-axis ratio. Preserves aspect ratio;
    /// the image may extend past the output on one axis.
    Fill,
}

impl ResizePolicy {
    /// Derives the applied scale from the raw per-axis scale.
    #[inline]
    pub fn apply(self, raw: Vec2) -> Vec2 {
        match self {
            ResizePolicy::Stretch => raw,
            ResizePolicy::Letterbox => Vec2::splat(raw.min_component()),
            ResizePolicy::Fill => Vec2::splat(raw.max_component()),
        }
    }
}

/// Cached scale derived from a virtual/physical/policy triple.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ScaleState {
    /// Per-axis `physical / virtual` ratio, before any policy.
    pub raw: Vec2,
    /// Policy-adjusted scale actually used for compositing.
    pub applied: Vec2,
}

impl ScaleState {
    pub fn compute(virtual_res: Extent, physical_res: Extent, policy: ResizePolicy) -> Self {
        let raw = physical_res.as_vec2() / virtual_res.as_vec2();
        ScaleState {
            raw,
            applied: policy.apply(raw),
        }
    }
}
