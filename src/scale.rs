use crate::levels::Frame;
use crate::viewport::Viewport;

/// Maps tick offsets to horizontal pixels for one viewport and width.
///
/// Layout and hit-testing both go through [`Scale::bar_x`] and
/// [`Scale::drawn_extent`], so what is drawn and what is clickable agree to
/// the last bit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub pixels_per_tick: f64,
    pixel_width: f64,
    range_start_ticks: f64,
}

impl Scale {
    /// `None` when the mapping would divide by zero or produce garbage, which
    /// includes a viewport range outside `[0, 1]`.
    pub fn new(total: u64, viewport: &Viewport, pixel_width: f64) -> Option<Scale> {
        let (min, max) = (viewport.range_min, viewport.range_max);
        if total == 0 || !(0.0 <= min && min < max && max <= 1.0) {
            return None;
        }
        if !(pixel_width > 0.0) || !pixel_width.is_finite() {
            return None;
        }
        let total = total as f64;
        Some(Scale {
            pixels_per_tick: pixel_width / total / (max - min),
            pixel_width,
            range_start_ticks: total * min,
        })
    }

    pub fn pixel_width(&self) -> f64 {
        self.pixel_width
    }

    pub fn bar_x(&self, ticks: u64) -> f64 {
        (ticks as f64 - self.range_start_ticks) * self.pixels_per_tick
    }

    /// Pixel start and end of a frame.
    pub fn span(&self, frame: &Frame) -> (f64, f64) {
        (self.bar_x(frame.start), self.bar_x(frame.end()))
    }

    /// The painted part of `[start, end)` ticks: inset by `border` on both
    /// sides and clipped to the surface. Can be empty or inverted.
    pub fn drawn_extent(&self, start: u64, end: u64, border: f64) -> (f64, f64) {
        let left = (self.bar_x(start) + border).max(0.0);
        let right = (self.bar_x(end) - border).min(self.pixel_width);
        (left, right)
    }

    /// First tick left of which nothing is visible.
    pub fn range_start_ticks(&self) -> f64 {
        self.range_start_ticks
    }
}
