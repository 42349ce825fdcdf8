//! Panel layout: the board array, support bars and mousebites.
//!
//! [`build_layout`] turns one board's bounds into a `repeat_x × repeat_y`
//! array surrounded by a frame. Recoverable problems (unknown mousebite
//! codes, unevenly spaced support bars) are recorded in the caller's
//! [`ValidationReport`] and the build carries on.
//!
//! # Example
//!
//! ```
//! use paneliser::layout::{build_layout, BoardBounds, LayoutRequest};
//! use paneliser::validation::ValidationReport;
//!
//! let request = LayoutRequest::new(BoardBounds::new(20.0, 15.0, 0.0, 0.0), 2, 2);
//! let mut report = ValidationReport::new();
//! let layout = build_layout(&request, &mut report).unwrap();
//! assert_eq!((layout.width, layout.height), (56.0, 46.0));
//! ```

mod model;
pub mod mousebite;

pub use model::{
    round_to, surface_area_dm2, Axis, BoardBounds, PanelLayout, PanelPoint, SupportBarSchedule,
    MAX_DECIMAL_PRECISION,
};
pub use mousebite::{
    place_mousebite, Alignment, BiteGeometry, Location, MousebiteDescriptor, CORNER_MARGIN,
};

use std::collections::BTreeMap;

use crate::config::PanelConfig;
use crate::error::PaneliserError;
use crate::validation::{IssueCode, IssueContext, PanelIssue, ValidationReport};

/// Everything the layout builder needs, resolved from config and CLI input.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutRequest {
    pub bounds: BoardBounds,
    pub repeat_x: u32,
    pub repeat_y: u32,
    /// Raw mousebite codes as entered by the user.
    pub mousebite_codes: Vec<String>,
    pub support_bars: SupportBarSchedule,
    pub route_diameter: f64,
    pub mousebite_diameter: f64,
    pub frame_width: f64,
    pub support_bar_width: f64,
    pub decimal_precision: u32,
}

impl LayoutRequest {
    /// A request using the default tooling and no mousebites.
    pub fn new(bounds: BoardBounds, repeat_x: u32, repeat_y: u32) -> Self {
        Self::from_config(&PanelConfig::default(), bounds, repeat_x, repeat_y)
    }

    /// A request taking tooling sizes from `config`.
    pub fn from_config(
        config: &PanelConfig,
        bounds: BoardBounds,
        repeat_x: u32,
        repeat_y: u32,
    ) -> Self {
        Self {
            bounds,
            repeat_x,
            repeat_y,
            mousebite_codes: Vec::new(),
            support_bars: SupportBarSchedule::none(),
            route_diameter: config.route_diameter,
            mousebite_diameter: config.mousebite_diameter,
            frame_width: config.frame_width,
            support_bar_width: config.support_bar_width,
            decimal_precision: config.decimal_precision,
        }
    }

    /// Sets the mousebite codes.
    pub fn with_mousebites<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mousebite_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the support bar cadence.
    pub fn with_support_bars(mut self, support_bars: SupportBarSchedule) -> Self {
        self.support_bars = support_bars;
        self
    }

    fn repeat(&self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.repeat_x,
            Axis::Y => self.repeat_y,
        }
    }

    fn board_extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.bounds.size_x,
            Axis::Y => self.bounds.size_y,
        }
    }

    fn bar_gap(&self) -> f64 {
        self.support_bar_width + self.route_diameter
    }
}

/// Builds the panel layout.
///
/// Fails only on structurally invalid input (zero repeat, zero bar cadence,
/// non-positive board or tooling size, precision past
/// [`MAX_DECIMAL_PRECISION`]). Unknown mousebite codes and uneven support bar
/// spacing are added to `report` as warnings.
pub fn build_layout(
    request: &LayoutRequest,
    report: &mut ValidationReport,
) -> Result<PanelLayout, PaneliserError> {
    check_request(request)?;

    let precision = request.decimal_precision;
    let descriptors = resolve_descriptors(&request.mousebite_codes, report);
    warn_uneven_bars(request, report);

    let (width, step_x) = axis_size(request, Axis::X);
    let (height, step_y) = axis_size(request, Axis::Y);
    log::info!("Panel size: {}mm x {}mm", width, height);

    let geometry = BiteGeometry::new(request.route_diameter, request.mousebite_diameter);
    let bite_offsets: Vec<PanelPoint> = descriptors
        .iter()
        .map(|&descriptor| place_mousebite(descriptor, &request.bounds, &geometry, precision))
        .collect();

    let start = request.frame_width + request.route_diameter;
    let x_start = start + request.bounds.origin_x;
    let y_start = start + request.bounds.origin_y;

    let mut boards = Vec::with_capacity(request.repeat_x as usize * request.repeat_y as usize);
    let mut mousebites: BTreeMap<(i64, i64), PanelPoint> = BTreeMap::new();

    let mut y = y_start;
    for row in 0..request.repeat_y {
        let mut x = x_start;
        for column in 0..request.repeat_x {
            let board = PanelPoint::new(x, y).rounded(precision);
            boards.push(board);

            for offset in &bite_offsets {
                let bite = board.offset(offset.x, offset.y).rounded(precision);
                mousebites.entry(bite.key(precision)).or_insert(bite);
            }

            x += request.bounds.size_x + request.route_diameter;
            if request.support_bars.bar_after(Axis::X, column, request.repeat_x) {
                x += request.bar_gap();
            }
        }

        y += request.bounds.size_y + request.route_diameter;
        if request.support_bars.bar_after(Axis::Y, row, request.repeat_y) {
            y += request.bar_gap();
        }
    }

    log::debug!("Board coords: {:?}", boards);
    log::debug!("Mousebite coords: {:?}", mousebites.values());

    let width = round_to(width, precision);
    let height = round_to(height, precision);

    Ok(PanelLayout {
        bounds: request.bounds,
        repeat_x: request.repeat_x,
        repeat_y: request.repeat_y,
        step_x: round_to(step_x, precision),
        step_y: round_to(step_y, precision),
        width,
        height,
        surface_area: surface_area_dm2(width, height),
        board_surface_area: request.bounds.surface_area(),
        frame_width: request.frame_width,
        boards,
        mousebites: mousebites.into_values().collect(),
    })
}

fn check_request(request: &LayoutRequest) -> Result<(), PaneliserError> {
    for axis in [Axis::X, Axis::Y] {
        let repeat = request.repeat(axis);
        if repeat == 0 {
            return Err(PaneliserError::InvalidRepeat {
                axis: axis.as_char(),
                value: repeat,
            });
        }
        if let Some(0) = request.support_bars.every(axis) {
            return Err(PaneliserError::InvalidSupportBarCadence {
                axis: axis.as_char(),
                value: 0,
            });
        }
    }

    if request.repeat_x.checked_mul(request.repeat_y).is_none() {
        return Err(PaneliserError::TooManyBoards {
            repeat_x: request.repeat_x,
            repeat_y: request.repeat_y,
        });
    }

    if !request.bounds.is_valid() {
        return Err(PaneliserError::UnsupportedInput(format!(
            "board size {}mm x {}mm must be positive and finite",
            request.bounds.size_x, request.bounds.size_y
        )));
    }

    for (name, value) in [
        ("route diameter", request.route_diameter),
        ("mousebite diameter", request.mousebite_diameter),
        ("frame width", request.frame_width),
        ("support bar width", request.support_bar_width),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(PaneliserError::UnsupportedInput(format!(
                "{} {}mm must be positive and finite",
                name, value
            )));
        }
    }

    if request.decimal_precision > MAX_DECIMAL_PRECISION {
        return Err(PaneliserError::UnsupportedInput(format!(
            "decimal precision {} is above the maximum of {}",
            request.decimal_precision, MAX_DECIMAL_PRECISION
        )));
    }

    Ok(())
}

/// Parses and deduplicates the mousebite codes, reporting invalid ones.
fn resolve_descriptors(codes: &[String], report: &mut ValidationReport) -> Vec<MousebiteDescriptor> {
    let mut descriptors = Vec::new();

    for code in codes {
        match MousebiteDescriptor::parse(code) {
            Ok(descriptor) => {
                if !descriptors.contains(&descriptor) {
                    descriptors.push(descriptor);
                }
            }
            Err(err) => {
                log::warn!("Location {} is invalid, removing it from the list", code);
                report.add(PanelIssue::warning(
                    IssueCode::InvalidMousebiteCode,
                    err.to_string(),
                    IssueContext::Mousebite { code: code.clone() },
                ));
            }
        }
    }

    descriptors
}

fn warn_uneven_bars(request: &LayoutRequest, report: &mut ValidationReport) {
    for axis in [Axis::X, Axis::Y] {
        let repeat = request.repeat(axis);
        if let Some(every) = request.support_bars.every(axis) {
            if (repeat - 1) % every != 0 {
                log::warn!(
                    "Support bars along {} are placed unevenly ({} boards, bar every {})",
                    axis,
                    repeat,
                    every
                );
                report.add(PanelIssue::warning(
                    IssueCode::UnevenSupportBarSpacing,
                    format!(
                        "{} boards with a bar every {} leaves an uneven final group",
                        repeat, every
                    ),
                    IssueContext::SupportBars {
                        axis,
                        repeat,
                        every,
                    },
                ));
            }
        }
    }
}

/// Panel size and board step along one axis.
fn axis_size(request: &LayoutRequest, axis: Axis) -> (f64, f64) {
    let repeat = request.repeat(axis);
    let pitch = request.board_extent(axis) + request.route_diameter;
    let bars = request.support_bars.bar_count(axis, repeat) as f64 * request.bar_gap();

    let size = 2.0 * request.frame_width + request.route_diameter + repeat as f64 * pitch + bars;
    (size, pitch + bars)
}
