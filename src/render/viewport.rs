//! Viewport rectangle pushed to the native instance.
//!
//! A [`Viewport`] is the visible window into the page, expressed in content
//! coordinates: its top-left corner `(x, y)` is the current scroll offset and
//! `width`/`height` are the extents of the hosting surface in pixels.
//!
//! # Examples
//!
//! ```
//! use surface_bridge::render::Viewport;
//!
//! let vp = Viewport::new(0, 120, 800, 600);
//! assert_eq!(vp.y, 120);
//! assert_eq!(vp, Viewport { x: 0, y: 120, width: 800, height: 600 });
//! ```

/// Visible area of the page in content coordinates.
#[derive(Clone, Eq, PartialEq, Copy, Default)]
pub struct Viewport {
    /// Horizontal scroll offset in pixels.
    pub x: i32,

    /// Vertical scroll offset in pixels.
    pub y: i32,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,
}

impl std::fmt::Debug for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Viewport {{ x: {}, y: {}, width: {}, height: {} }}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl Viewport {
    /// Creates a new [`Viewport`] with the given position and size.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_lists_all_fields() {
        let vp = Viewport::new(-3, 40, 100, 50);
        assert_eq!(format!("{:?}", vp), "Viewport { x: -3, y: 40, width: 100, height: 50 }");
    }
}
