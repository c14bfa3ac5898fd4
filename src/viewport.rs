use crate::error::ViewportError;
use crate::levels::Levels;

/// The zoomed window on the x axis plus the focused level.
///
/// Ranges are fractions of the total sample count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub range_min: f64,
    pub range_max: f64,
    pub top_level_index: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            range_min: 0.0,
            range_max: 1.0,
            top_level_index: 0,
        }
    }
}

impl Viewport {
    pub fn new(
        range_min: f64,
        range_max: f64,
        top_level_index: usize,
    ) -> Result<Viewport, ViewportError> {
        let valid = range_min.is_finite()
            && range_max.is_finite()
            && (0.0..=1.0).contains(&range_min)
            && (0.0..=1.0).contains(&range_max)
            && range_min < range_max;
        if !valid {
            return Err(ViewportError::Degenerate {
                range_min,
                range_max,
            });
        }
        Ok(Viewport {
            range_min,
            range_max,
            top_level_index,
        })
    }

    /// Zooms so that the given bar spans the whole width and its level is
    /// focused. The viewport is left untouched on error.
    pub fn zoom_to(
        &mut self,
        levels: &Levels,
        level_index: usize,
        bar_index: usize,
    ) -> Result<(), ViewportError> {
        let frame = levels
            .frame(level_index, bar_index)
            .ok_or(ViewportError::NoSuchBar {
                level_index,
                bar_index,
            })?;
        let total = levels.total() as f64;
        *self = Viewport::new(
            frame.start as f64 / total,
            frame.end() as f64 / total,
            level_index,
        )?;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Viewport::default();
    }

    pub fn is_zoomed(&self) -> bool {
        *self != Viewport::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{ProfileNode, flatten};

    fn levels() -> Levels {
        flatten(&ProfileNode::with_children(
            "total",
            0,
            100,
            vec![
                ProfileNode::leaf("a", 25),
                ProfileNode::leaf("empty", 0),
                ProfileNode::leaf("b", 75),
            ],
        ))
        .unwrap()
    }

    #[test]
    fn test_zoom_then_reset() {
        let levels = levels();
        let mut viewport = Viewport::default();
        viewport.zoom_to(&levels, 1, 2).unwrap();
        assert_eq!(viewport, Viewport::new(0.25, 1.0, 1).unwrap());
        assert!(viewport.is_zoomed());

        viewport.reset();
        assert_eq!(
            viewport,
            Viewport {
                range_min: 0.0,
                range_max: 1.0,
                top_level_index: 0
            }
        );
        assert!(!viewport.is_zoomed());
    }

    #[test]
    fn test_zoom_rejects_bad_targets() {
        let levels = levels();
        let mut viewport = Viewport::default();
        assert!(matches!(
            viewport.zoom_to(&levels, 1, 1),
            Err(ViewportError::Degenerate { .. })
        ));
        assert_eq!(
            viewport.zoom_to(&levels, 3, 0),
            Err(ViewportError::NoSuchBar {
                level_index: 3,
                bar_index: 0
            })
        );
        assert_eq!(viewport, Viewport::default());
    }

    #[test]
    fn test_new_validates_range() {
        assert!(Viewport::new(0.2, 0.1, 0).is_err());
        assert!(Viewport::new(0.2, 0.2, 0).is_err());
        assert!(Viewport::new(-0.1, 0.5, 0).is_err());
        assert!(Viewport::new(0.0, f64::NAN, 0).is_err());
        assert!(Viewport::new(0.0, 0.5, 2).is_ok());
    }
}
