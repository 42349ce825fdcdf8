//! Core data model for a panel layout.
//!
//! All coordinates are millimetres in panel space, with the origin at the
//! panel's bottom-left corner.

use std::fmt;

use crate::outline::{OutlineBounds, OutlineUnits};

/// Size and drawing-origin offset of the board being repeated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardBounds {
    pub size_x: f64,
    pub size_y: f64,
    /// Distance from the board's drawing origin to its bounding-box minimum
    /// corner, sign-flipped.
    pub origin_x: f64,
    pub origin_y: f64,
}

impl BoardBounds {
    /// Creates bounds from a board size and origin offset.
    pub fn new(size_x: f64, size_y: f64, origin_x: f64, origin_y: f64) -> Self {
        Self {
            size_x,
            size_y,
            origin_x,
            origin_y,
        }
    }

    /// Derives bounds from `((min_x, max_x), (min_y, max_y))` in millimetres.
    pub fn from_extents(x: (f64, f64), y: (f64, f64)) -> Self {
        Self {
            size_x: x.1 - x.0,
            size_y: y.1 - y.0,
            origin_x: -x.0,
            origin_y: -y.0,
        }
    }

    /// Derives bounds from an outline, converting imperial units to mm.
    pub fn from_outline(outline: &OutlineBounds) -> Self {
        let scale = match outline.units {
            OutlineUnits::Metric => 1.0,
            OutlineUnits::Imperial => 25.4,
        };
        Self::from_extents(
            (outline.min_x * scale, outline.max_x * scale),
            (outline.min_y * scale, outline.max_y * scale),
        )
    }

    /// Board surface area in dm².
    pub fn surface_area(&self) -> f64 {
        surface_area_dm2(self.size_x, self.size_y)
    }

    /// Returns true if both dimensions are finite and positive.
    pub fn is_valid(&self) -> bool {
        self.size_x.is_finite()
            && self.size_y.is_finite()
            && self.origin_x.is_finite()
            && self.origin_y.is_finite()
            && self.size_x > 0.0
            && self.size_y > 0.0
    }
}

/// A resolved point in panel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PanelPoint {
    pub x: f64,
    pub y: f64,
}

impl PanelPoint {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rounds both coordinates to `precision` decimal places.
    pub fn rounded(self, precision: u32) -> Self {
        Self::new(round_to(self.x, precision), round_to(self.y, precision))
    }

    /// Integer key used for set membership after rounding.
    pub(crate) fn key(self, precision: u32) -> (i64, i64) {
        let scale = 10f64.powi(precision.min(MAX_DECIMAL_PRECISION) as i32);
        (
            (self.x * scale).round() as i64,
            (self.y * scale).round() as i64,
        )
    }

    /// Translates the point by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for PanelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Panel axis, used to label per-axis settings and warnings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn as_char(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Optional support bar cadence per axis.
///
/// `every_n_x` inserts a vertical bar after every n-th column; `every_n_y`
/// inserts a horizontal bar after every n-th row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SupportBarSchedule {
    pub every_n_x: Option<u32>,
    pub every_n_y: Option<u32>,
}

impl SupportBarSchedule {
    /// No support bars on either axis.
    pub fn none() -> Self {
        Self::default()
    }

    /// Cadence on the given axis.
    pub fn every(&self, axis: Axis) -> Option<u32> {
        match axis {
            Axis::X => self.every_n_x,
            Axis::Y => self.every_n_y,
        }
    }

    /// Number of bars placed along `axis` for `repeat` boards.
    pub fn bar_count(&self, axis: Axis, repeat: u32) -> u32 {
        match self.every(axis) {
            Some(every) if every > 0 => repeat.saturating_sub(1) / every,
            _ => 0,
        }
    }

    /// Whether a bar follows the board at `index` (0-based) along `axis`.
    pub(crate) fn bar_after(&self, axis: Axis, index: u32, repeat: u32) -> bool {
        match self.every(axis) {
            Some(every) if every > 0 => (index + 1) % every == 0 && index + 1 < repeat,
            _ => false,
        }
    }
}

/// The computed panel: dimensions, board instances and mousebites.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelLayout {
    pub bounds: BoardBounds,
    pub repeat_x: u32,
    pub repeat_y: u32,
    /// Board pitch including route clearance and support bars.
    pub step_x: f64,
    pub step_y: f64,
    pub width: f64,
    pub height: f64,
    /// Panel surface area in dm².
    pub surface_area: f64,
    /// Board surface area in dm².
    pub board_surface_area: f64,
    pub frame_width: f64,
    /// Board drawing-origin positions, row-major, in render order.
    pub boards: Vec<PanelPoint>,
    /// Deduplicated mousebite centres, sorted by rounded coordinate.
    pub mousebites: Vec<PanelPoint>,
}

impl PanelLayout {
    /// Number of board instances.
    pub fn board_count(&self) -> usize {
        self.boards.len()
    }

    /// Bottom-left corner of the first board's bounding box.
    pub fn first_board_corner(&self) -> Option<PanelPoint> {
        self.boards
            .first()
            .map(|origin| origin.offset(-self.bounds.origin_x, -self.bounds.origin_y))
    }
}

/// Finest rounding the layout supports. Larger precisions are clamped.
pub const MAX_DECIMAL_PRECISION: u32 = 10;

/// Rounds `value` to `precision` decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision.min(MAX_DECIMAL_PRECISION) as i32);
    let rounded = (value * scale).round() / scale;
    // Avoid emitting "-0" for values that round to zero.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Converts a width and height in mm to an area in dm², stored at 6dp.
pub fn surface_area_dm2(width: f64, height: f64) -> f64 {
    round_to(width * height / 10_000.0, 6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_from_extents_flip_origin() {
        let bounds = BoardBounds::from_extents((-5.0, 15.0), (2.0, 17.0));
        assert_eq!(bounds.size_x, 20.0);
        assert_eq!(bounds.size_y, 15.0);
        assert_eq!(bounds.origin_x, 5.0);
        assert_eq!(bounds.origin_y, -2.0);
    }

    #[test]
    fn bounds_from_imperial_outline_converts() {
        let outline = OutlineBounds {
            min_x: 0.0,
            max_x: 1.0,
            min_y: 0.0,
            max_y: 2.0,
            units: OutlineUnits::Imperial,
        };
        let bounds = BoardBounds::from_outline(&outline);
        assert!((bounds.size_x - 25.4).abs() < 1e-9);
        assert!((bounds.size_y - 50.8).abs() < 1e-9);
    }

    #[test]
    fn round_to_stays_finite_past_max_precision() {
        assert_eq!(round_to(12.345, 400), round_to(12.345, MAX_DECIMAL_PRECISION));
        assert!(round_to(56.0, u32::MAX).is_finite());
        assert_eq!(PanelPoint::new(1.5, 2.5).rounded(400), PanelPoint::new(1.5, 2.5));
    }

    #[test]
    fn round_to_normalises_negative_zero() {
        assert_eq!(round_to(-0.00001, 4), 0.0);
        assert!(round_to(-0.00001, 4).is_sign_positive());
        assert_eq!(round_to(1.23456, 2), 1.23);
    }

    #[test]
    fn bar_count_is_fence_post() {
        let bars = SupportBarSchedule {
            every_n_x: Some(2),
            every_n_y: None,
        };
        assert_eq!(bars.bar_count(Axis::X, 1), 0);
        assert_eq!(bars.bar_count(Axis::X, 4), 1);
        assert_eq!(bars.bar_count(Axis::X, 5), 2);
        assert_eq!(bars.bar_count(Axis::Y, 5), 0);
        assert!(bars.bar_after(Axis::X, 1, 5));
        assert!(!bars.bar_after(Axis::X, 3, 4));
    }

    #[test]
    fn surface_area_in_square_decimetres() {
        assert_eq!(surface_area_dm2(100.0, 100.0), 1.0);
        assert_eq!(surface_area_dm2(56.0, 46.0), 0.2576);
    }
}
