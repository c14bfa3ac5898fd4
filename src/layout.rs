//! Turns levels into pixel rectangles for the current viewport.
//!
//! Each level is scanned left to right from its first visible bar and the
//! scan stops at the first bar starting past the right edge. Runs of
//! adjacent bars that are too narrow to read are merged into one neutral
//! block, which bounds the output of a level by the pixel width rather than
//! by the number of frames.

use crate::config::LayoutConfig;
use crate::levels::{Frame, Levels};
use crate::scale::Scale;
use crate::search::fuzzy_match;
use crate::viewport::Viewport;

const NEUTRAL_RGB: (u8, u8, u8) = (176, 176, 176);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarColor {
    /// Hue in degrees, saturation and lightness in percent.
    Hsl {
        hue: f64,
        saturation: f64,
        lightness: f64,
    },
    /// Collapsed runs and bars dimmed by a search query.
    Neutral,
}

impl BarColor {
    pub fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            BarColor::Hsl {
                hue,
                saturation,
                lightness,
            } => hsl_to_rgb(
                hue,
                (saturation / 100.0).clamp(0.0, 1.0),
                (lightness / 100.0).clamp(0.0, 1.0),
            ),
            BarColor::Neutral => NEUTRAL_RGB,
        }
    }
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match (h as u32) / 60 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

/// One rectangle to paint. Recomputed on every layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBar<'a> {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub collapsed: bool,
    /// `None` for collapsed runs.
    pub label: Option<&'a str>,
    /// Whether the label is wide enough to draw. Text is clipped to the bar.
    pub show_label: bool,
    pub label_x: f64,
    pub level_index: usize,
    /// First bar of the run.
    pub bar_index: usize,
    pub bar_count: usize,
    /// Ticks covered by the run.
    pub value: u64,
    pub color: BarColor,
}

/// Lays out every level. Returns nothing for a degenerate viewport, a
/// non-positive width or an empty profile.
pub fn layout<'a>(
    levels: &'a Levels,
    viewport: &Viewport,
    pixel_width: f64,
    query: &str,
    config: &LayoutConfig,
) -> Vec<RenderedBar<'a>> {
    let Some(scale) = Scale::new(levels.total(), viewport, pixel_width) else {
        log::debug!(
            "skipping layout: total={} range=[{}, {}] width={}",
            levels.total(),
            viewport.range_min,
            viewport.range_max,
            pixel_width
        );
        return Vec::new();
    };

    let cx = LevelContext {
        scale: &scale,
        viewport,
        total: levels.total(),
        query,
        config,
    };
    let mut bars = Vec::new();
    for (level_index, level) in levels.iter().enumerate() {
        layout_level(&mut bars, level, level_index, &cx);
    }
    bars
}

struct LevelContext<'c> {
    scale: &'c Scale,
    viewport: &'c Viewport,
    total: u64,
    query: &'c str,
    config: &'c LayoutConfig,
}

fn layout_level<'a>(
    bars: &mut Vec<RenderedBar<'a>>,
    level: &'a [Frame],
    level_index: usize,
    cx: &LevelContext<'_>,
) {
    let scale = cx.scale;
    let config = cx.config;
    let is_narrow = |frame: &Frame| {
        let (start, end) = scale.span(frame);
        end - start <= config.collapse_threshold
    };

    let first_visible_tick = scale.range_start_ticks();
    let mut i = level.partition_point(|frame| frame.end() as f64 <= first_visible_tick);

    while i < level.len() {
        let first = i;
        let frame = &level[i];
        let bar_x = scale.bar_x(frame.start);
        if bar_x > scale.pixel_width() {
            break;
        }

        let collapsed = is_narrow(frame);
        if collapsed {
            while i + 1 < level.len()
                && level[i].end() == level[i + 1].start
                && is_narrow(&level[i + 1])
            {
                i += 1;
            }
        }
        let run_end = level[i].end();
        i += 1;

        let border = if collapsed { 0.0 } else { config.bar_border_width };
        let (left, right) = scale.drawn_extent(frame.start, run_end, border);
        let width = right - left;
        if width < config.hide_threshold {
            continue;
        }

        let value = run_end - frame.start;
        let color = if collapsed {
            BarColor::Neutral
        } else {
            bar_color(value, &frame.label, level_index, cx)
        };

        bars.push(RenderedBar {
            x: left,
            y: level_index as f64 * config.pixels_per_level,
            width,
            height: config.pixels_per_level,
            collapsed,
            label: (!collapsed).then_some(frame.label.as_str()),
            show_label: !collapsed && width >= config.label_threshold,
            label_x: bar_x.max(0.0) + config.bar_text_padding_left,
            level_index,
            bar_index: first,
            bar_count: i - first,
            value,
            color,
        });
    }
}

/// Hotter bars get a lower hue and a higher lightness. Intensity is relative
/// to the visible range so a zoomed-in bar is as intense as the root.
fn bar_color(value: u64, label: &str, level_index: usize, cx: &LevelContext<'_>) -> BarColor {
    let range = cx.viewport.range_max - cx.viewport.range_min;
    let intensity = ((value as f64 / cx.total as f64) / range).min(1.0);
    let hue = 50.0 - 50.0 * intensity;
    let lightness = 65.0 + 7.0 * intensity;
    let hsl = |lightness| BarColor::Hsl {
        hue,
        saturation: 100.0,
        lightness,
    };

    if !cx.query.is_empty() {
        if fuzzy_match(label, cx.query) {
            hsl(lightness)
        } else {
            BarColor::Neutral
        }
    } else if level_index < cx.viewport.top_level_index {
        hsl(lightness + 15.0)
    } else {
        hsl(lightness)
    }
}
