//! Mousebite location codes and placement.
//!
//! A code is two characters: a location (`b`, `t`, `l`, `r`) followed by an
//! alignment along the board edge (`c` centre, `l`/`r` near the left/right
//! end, `x`/`v` at the left/right third). Codes are case-insensitive.

use std::fmt;

use super::model::{BoardBounds, PanelPoint};
use crate::error::PaneliserError;

/// Keeps a mousebite clear of the board's corner radius (mm).
pub const CORNER_MARGIN: f64 = 1.2;

/// Which board edge the mousebite sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Location {
    Bottom,
    Top,
    Left,
    Right,
}

impl Location {
    /// Unit vector from the board centre towards this edge.
    pub fn direction(self) -> (f64, f64) {
        match self {
            Location::Bottom => (0.0, -1.0),
            Location::Top => (0.0, 1.0),
            Location::Left => (-1.0, 0.0),
            Location::Right => (1.0, 0.0),
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'b' => Some(Location::Bottom),
            't' => Some(Location::Top),
            'l' => Some(Location::Left),
            'r' => Some(Location::Right),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Location::Bottom => 'b',
            Location::Top => 't',
            Location::Left => 'l',
            Location::Right => 'r',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Location::Bottom => "bottom",
            Location::Top => "top",
            Location::Left => "left",
            Location::Right => "right",
        }
    }
}

/// Position of the mousebite along its edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Alignment {
    Center,
    Left,
    Right,
    LeftThird,
    RightThird,
}

impl Alignment {
    /// Signed offset fraction in [-1, 1] along the edge.
    pub fn fraction(self) -> f64 {
        match self {
            Alignment::Center => 0.0,
            Alignment::Left => -0.8,
            Alignment::Right => 0.8,
            Alignment::LeftThird => -0.5,
            Alignment::RightThird => 0.5,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'c' => Some(Alignment::Center),
            'l' => Some(Alignment::Left),
            'r' => Some(Alignment::Right),
            'x' => Some(Alignment::LeftThird),
            'v' => Some(Alignment::RightThird),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Alignment::Center => 'c',
            Alignment::Left => 'l',
            Alignment::Right => 'r',
            Alignment::LeftThird => 'x',
            Alignment::RightThird => 'v',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Alignment::Center => "center",
            Alignment::Left => "left",
            Alignment::Right => "right",
            Alignment::LeftThird => "left third",
            Alignment::RightThird => "right third",
        }
    }
}

/// A parsed two-character mousebite code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MousebiteDescriptor {
    pub location: Location,
    pub alignment: Alignment,
}

impl MousebiteDescriptor {
    pub fn new(location: Location, alignment: Alignment) -> Self {
        Self {
            location,
            alignment,
        }
    }

    /// Parses a code such as `"bc"`. Surrounding whitespace is ignored.
    pub fn parse(code: &str) -> Result<Self, PaneliserError> {
        let invalid = || PaneliserError::InvalidMousebiteCode {
            code: code.to_string(),
        };

        let mut chars = code.trim().chars();
        let (Some(location), Some(alignment), None) = (chars.next(), chars.next(), chars.next())
        else {
            return Err(invalid());
        };

        Ok(Self {
            location: Location::from_char(location).ok_or_else(invalid)?,
            alignment: Alignment::from_char(alignment).ok_or_else(invalid)?,
        })
    }

    /// Every valid code, for help output.
    pub fn all() -> Vec<Self> {
        let locations = [
            Location::Bottom,
            Location::Top,
            Location::Left,
            Location::Right,
        ];
        let alignments = [
            Alignment::Center,
            Alignment::Left,
            Alignment::Right,
            Alignment::LeftThird,
            Alignment::RightThird,
        ];
        locations
            .iter()
            .flat_map(|&location| {
                alignments
                    .iter()
                    .map(move |&alignment| Self::new(location, alignment))
            })
            .collect()
    }
}

impl fmt::Display for MousebiteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.location.as_char(), self.alignment.as_char())
    }
}

/// Tooling sizes that drive mousebite placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiteGeometry {
    pub route_diameter: f64,
    pub mousebite_diameter: f64,
    pub corner_margin: f64,
}

impl BiteGeometry {
    pub fn new(route_diameter: f64, mousebite_diameter: f64) -> Self {
        Self {
            route_diameter,
            mousebite_diameter,
            corner_margin: CORNER_MARGIN,
        }
    }
}

/// Resolves a descriptor to an offset from the board's drawing origin.
///
/// The returned point is relative to the board origin (the position stored
/// for each board instance), rounded to `precision` decimal places.
pub fn place_mousebite(
    descriptor: MousebiteDescriptor,
    bounds: &BoardBounds,
    geometry: &BiteGeometry,
    precision: u32,
) -> PanelPoint {
    let (dir_x, dir_y) = descriptor.location.direction();
    let alignment = descriptor.alignment.fraction();

    let (along, perpendicular) = if dir_x != 0.0 {
        (
            dir_x * (bounds.size_x / 2.0 + geometry.route_diameter / 2.0),
            edge_offset(alignment, bounds.size_y, geometry),
        )
    } else {
        (
            dir_y * (bounds.size_y / 2.0 + geometry.route_diameter / 2.0),
            edge_offset(alignment, bounds.size_x, geometry),
        )
    };

    let (x, y) = if dir_x != 0.0 {
        (along, perpendicular)
    } else {
        (perpendicular, along)
    };

    let origin_to_center_x = bounds.size_x / 2.0 - bounds.origin_x;
    let origin_to_center_y = bounds.size_y / 2.0 - bounds.origin_y;

    let point = PanelPoint::new(x + origin_to_center_x, y + origin_to_center_y).rounded(precision);
    log::debug!(
        "Mousebite {} ({} {}) -> {}",
        descriptor,
        descriptor.alignment.name(),
        descriptor.location.name(),
        point
    );
    point
}

/// Offset along the edge, measured from the board centre.
fn edge_offset(alignment: f64, extent: f64, geometry: &BiteGeometry) -> f64 {
    let half = extent / 2.0;
    let sign = signum(alignment);
    let center_to_edge = alignment.abs() * half + geometry.mousebite_diameter;

    let magnitude = if center_to_edge > half {
        half - (geometry.mousebite_diameter + geometry.corner_margin)
    } else {
        center_to_edge - geometry.mousebite_diameter / 2.0 - geometry.corner_margin
    };

    (sign * magnitude).clamp(-half, half)
}

fn signum(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}
