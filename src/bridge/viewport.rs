//! Scroll geometry of a surface.
//!
//! [`ViewportState`] is the plain data: scroll offsets, the extents of the visible
//! surface and of the laid-out page, and the device pixel ratio.
//! [`ViewportController`] is the only thing allowed to mutate it. Every mutation
//! re-clamps the scroll offsets so that
//! `0 <= scroll_x <= max(0, content_width - view_width)` (and the same for `y`)
//! holds after any sequence of calls.
//!
//! All operations are total: they never fail and never panic.

use crate::render::Viewport;

/// Current scroll/extent state of a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    pub scroll_x: u32,
    pub scroll_y: u32,
    pub view_width: u32,
    pub view_height: u32,
    pub content_width: u32,
    pub content_height: u32,
    pub device_pixel_ratio: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scroll_x: 0,
            scroll_y: 0,
            view_width: 0,
            view_height: 0,
            content_width: 0,
            content_height: 0,
            device_pixel_ratio: 1.0,
        }
    }
}

impl ViewportState {
    /// Largest valid horizontal offset. Zero when the content is narrower than the view.
    #[inline]
    pub fn max_scroll_x(&self) -> u32 {
        self.content_width.saturating_sub(self.view_width)
    }

    #[inline]
    pub fn max_scroll_y(&self) -> u32 {
        self.content_height.saturating_sub(self.view_height)
    }

    fn clamp_scroll(&mut self) {
        self.scroll_x = self.scroll_x.min(self.max_scroll_x());
        self.scroll_y = self.scroll_y.min(self.max_scroll_y());
    }
}

/// Result of a [`ViewportController::scroll_by`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollDelta {
    /// Offset after the scroll
    pub x: u32,
    pub y: u32,
    /// Delta that was actually applied
    pub applied_dx: i32,
    pub applied_dy: i32,
    /// Delta that was asked for
    pub requested_dx: i32,
    pub requested_dy: i32,
}

impl ScrollDelta {
    /// True when the scroll was cut short by a content edge.
    pub fn hit_edge(&self) -> bool {
        self.applied_dx != self.requested_dx || self.applied_dy != self.requested_dy
    }

    /// True when nothing moved.
    pub fn is_noop(&self) -> bool {
        self.applied_dx == 0 && self.applied_dy == 0
    }
}

#[derive(Debug, Default, Clone)]
pub struct ViewportController {
    state: ViewportState,
}

impl ViewportController {
    pub fn new(device_pixel_ratio: f32) -> Self {
        let mut controller = Self::default();
        controller.set_device_pixel_ratio(device_pixel_ratio);
        controller
    }

    #[inline]
    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    /// The surface was resized. Content extents are unchanged but the valid
    /// scroll range may have shrunk.
    pub fn on_resize(&mut self, view_width: u32, view_height: u32) {
        self.state.view_width = view_width;
        self.state.view_height = view_height;
        self.state.clamp_scroll();
    }

    /// The native instance finished laying out the page.
    pub fn on_content_layout(&mut self, content_width: u32, content_height: u32) {
        self.state.content_width = content_width;
        self.state.content_height = content_height;
        self.state.clamp_scroll();
    }

    /// Ignores ratios that are not strictly positive and finite.
    pub fn set_device_pixel_ratio(&mut self, ratio: f32) -> bool {
        if ratio.is_finite() && ratio > 0.0 {
            self.state.device_pixel_ratio = ratio;
            true
        } else {
            log::warn!("Ignoring invalid device pixel ratio {}", ratio);
            false
        }
    }

    pub fn scroll_by(&mut self, dx: i32, dy: i32) -> ScrollDelta {
        let (x, applied_dx) = clamp_axis(self.state.scroll_x, dx, self.state.max_scroll_x());
        let (y, applied_dy) = clamp_axis(self.state.scroll_y, dy, self.state.max_scroll_y());

        self.state.scroll_x = x;
        self.state.scroll_y = y;

        ScrollDelta {
            x,
            y,
            applied_dx,
            applied_dy,
            requested_dx: dx,
            requested_dy: dy,
        }
    }

    /// Surface-local point to page coordinates.
    pub fn to_content_coordinates(&self, surface_x: i32, surface_y: i32) -> (i32, i32) {
        (
            saturating_offset(surface_x, self.state.scroll_x),
            saturating_offset(surface_y, self.state.scroll_y),
        )
    }

    /// Visible rectangle in content space, as pushed to the native instance.
    pub fn geometry(&self) -> Viewport {
        Viewport::new(
            clamp_to_i32(self.state.scroll_x),
            clamp_to_i32(self.state.scroll_y),
            self.state.view_width,
            self.state.view_height,
        )
    }
}

fn clamp_axis(current: u32, delta: i32, max: u32) -> (u32, i32) {
    let wanted = current as i64 + delta as i64;
    let next = wanted.clamp(0, max as i64);
    // Both operands are within u32 range, so the difference fits into an i64 and
    // its magnitude never exceeds |delta|.
    (next as u32, (next - current as i64) as i32)
}

fn saturating_offset(point: i32, offset: u32) -> i32 {
    clamp_to_i32_i64(point as i64 + offset as i64)
}

fn clamp_to_i32(v: u32) -> i32 {
    v.min(i32::MAX as u32) as i32
}

fn clamp_to_i32_i64(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
