/// Linear RGBA color.
///
/// Values are expected in linear space. sRGB conversion is handled by the
/// render target format.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Loud magenta, the traditional "nobody set a clear color" marker.
    #[inline]
    pub const fn fuchsia() -> Self {
        Self::new(1.0, 0.0, 1.0, 1.0)
    }
}
