use super::Vec2;

/// Integer pixel dimensions of a surface or render target.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both axes are at least one pixel.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.width >= 1 && self.height >= 1
    }

    #[inline]
    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Midpoint of a surface of this size, in pixels.
    #[inline]
    pub fn center(self) -> Vec2 {
        self.as_vec2() / 2.0
    }
}
