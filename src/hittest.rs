//! Maps a pointer position back to a bar.

use crate::config::LayoutConfig;
use crate::levels::{Frame, Levels};
use crate::scale::Scale;
use crate::viewport::Viewport;

/// Binary search for the bar under `pixel_x` in one level.
///
/// Only bars the layout paints on their own are selectable: a match that
/// is collapsed, or whose painted part is hidden, reports `None`, as does a
/// miss or a position off the surface.
pub fn find_bar(level: &[Frame], pixel_x: f64, scale: &Scale, config: &LayoutConfig) -> Option<usize> {
    if !(0.0..=scale.pixel_width()).contains(&pixel_x) {
        return None;
    }
    let mut lo = 0;
    let mut hi = level.len();

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let frame = &level[mid];
        let (start_of_bar, start_of_next_bar) = scale.span(frame);

        if start_of_bar <= pixel_x && pixel_x <= start_of_next_bar {
            let (left, right) = scale.drawn_extent(frame.start, frame.end(), config.bar_border_width);
            let painted = start_of_next_bar - start_of_bar > config.collapse_threshold
                && right - left >= config.hide_threshold;
            return painted.then_some(mid);
        }
        if start_of_bar > pixel_x {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    None
}

/// Hit-tests `pixel_x` on `level_index` for the given viewport and width.
pub fn hit_test(
    levels: &Levels,
    level_index: usize,
    pixel_x: f64,
    viewport: &Viewport,
    pixel_width: f64,
    config: &LayoutConfig,
) -> Option<usize> {
    let level = levels.level(level_index)?;
    let scale = Scale::new(levels.total(), viewport, pixel_width)?;
    find_bar(level, pixel_x, &scale, config)
}
