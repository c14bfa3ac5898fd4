//! An interactive flame graph: the flattened profile plus the only mutable
//! state, the viewport and the search query.

use crate::config::LayoutConfig;
use crate::error::ViewportError;
use crate::hittest::hit_test;
use crate::layout::{RenderedBar, layout};
use crate::levels::{Frame, Levels};
use crate::toptable::TopTable;
use crate::units::{SampleUnit, TooltipData};
use crate::viewport::Viewport;

/// Coordinates of a bar in the levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarRef {
    pub level_index: usize,
    pub bar_index: usize,
}

#[derive(Debug, Clone)]
pub struct Session {
    levels: Levels,
    unit: Option<SampleUnit>,
    config: LayoutConfig,
    viewport: Viewport,
    query: String,
}

impl Session {
    pub fn new(levels: Levels, unit: Option<SampleUnit>, config: LayoutConfig) -> Self {
        Session {
            levels,
            unit,
            config,
            viewport: Viewport::default(),
            query: String::new(),
        }
    }

    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn unit(&self) -> Option<SampleUnit> {
        self.unit
    }

    /// Height of the drawing surface for all levels.
    pub fn canvas_height(&self) -> f64 {
        self.levels.len() as f64 * self.config.pixels_per_level
    }

    pub fn render(&self, pixel_width: f64) -> Vec<RenderedBar<'_>> {
        layout(
            &self.levels,
            &self.viewport,
            pixel_width,
            &self.query,
            &self.config,
        )
    }

    /// The selectable bar under a pointer position, if any.
    pub fn hit_test(&self, x: f64, y: f64, pixel_width: f64) -> Option<BarRef> {
        if !(y >= 0.0) {
            return None;
        }
        let level_index = (y / self.config.pixels_per_level).floor() as usize;
        let bar_index = hit_test(
            &self.levels,
            level_index,
            x,
            &self.viewport,
            pixel_width,
            &self.config,
        )?;
        Some(BarRef {
            level_index,
            bar_index,
        })
    }

    pub fn frame(&self, bar: BarRef) -> Option<&Frame> {
        self.levels.frame(bar.level_index, bar.bar_index)
    }

    /// Zooms into the clicked bar. A click that hits nothing is a no-op.
    pub fn click(&mut self, x: f64, y: f64, pixel_width: f64) -> Option<BarRef> {
        let bar = self.hit_test(x, y, pixel_width)?;
        match self.zoom_to(bar) {
            Ok(()) => Some(bar),
            Err(err) => {
                log::debug!("ignoring click on {bar:?}: {err}");
                None
            }
        }
    }

    pub fn zoom_to(&mut self, bar: BarRef) -> Result<(), ViewportError> {
        self.viewport
            .zoom_to(&self.levels, bar.level_index, bar.bar_index)
    }

    /// Back to the whole graph with no search.
    pub fn reset(&mut self) {
        self.viewport.reset();
        self.query.clear();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn tooltip(&self, x: f64, y: f64, pixel_width: f64) -> Option<TooltipData> {
        let frame = self.frame(self.hit_test(x, y, pixel_width)?)?;
        Some(TooltipData::new(
            &frame.label,
            frame.value,
            self.levels.total(),
            self.unit,
        ))
    }

    /// The top table, narrowed to the current query.
    pub fn top_table(&self) -> TopTable {
        let table = TopTable::build(&self.levels, self.unit);
        if self.query.is_empty() {
            table
        } else {
            table.filter(&self.query)
        }
    }
}
