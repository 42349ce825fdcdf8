//! Panel dimension checks.
//!
//! This module compares a finished layout against size limits:
//! - The user's configured maximum panel size
//! - The manufacturer's standard surface area (optional)
//! - The manufacturer's maximum panel size
//!
//! Checks never fail; they add warnings to a [`ValidationReport`].

mod report;

pub use report::{IssueCode, IssueContext, PanelIssue, ValidationReport};

use crate::config::PanelConfig;
use crate::layout::PanelLayout;

/// Limits a panel is checked against.
#[derive(Clone, Debug, PartialEq)]
pub struct DimensionLimits {
    /// User's configured maximum panel size (mm).
    pub configured_max: (f64, f64),
    /// Manufacturer's maximum panel size (mm).
    pub manufacturer_max: (f64, f64),
    /// Manufacturer's standard surface area (dm²).
    pub manufacturer_max_area: f64,
    /// Whether the surface area check runs.
    pub show_area_warning: bool,
}

impl DimensionLimits {
    pub fn from_config(config: &PanelConfig) -> Self {
        Self {
            configured_max: config.max_panel,
            manufacturer_max: config.manufacturer_max,
            manufacturer_max_area: config.manufacturer_max_area,
            show_area_warning: config.show_area_warning,
        }
    }
}

/// Checks a layout's size against `limits`.
pub fn validate_layout(layout: &PanelLayout, limits: &DimensionLimits) -> ValidationReport {
    validate_dimensions(layout.width, layout.height, layout.surface_area, limits)
}

/// Checks panel width, height and area against `limits`.
///
/// Dimension checks accept either orientation of the limit. Checks run in
/// a fixed order: configured size, surface area, manufacturer size.
pub fn validate_dimensions(
    width: f64,
    height: f64,
    surface_area: f64,
    limits: &DimensionLimits,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    if !fits(width, height, limits.configured_max) {
        report.add(PanelIssue::warning(
            IssueCode::ExceedsConfiguredDimensions,
            "Panel is larger than the configured maximum panel size",
            dimensions_context(width, height, limits.configured_max),
        ));
    }

    if limits.show_area_warning && surface_area > limits.manufacturer_max_area {
        report.add(PanelIssue::warning(
            IssueCode::ExceedsSurfaceArea,
            "Panel surface area is above the manufacturer's standard area and may cost more",
            IssueContext::Area {
                area: surface_area,
                max_area: limits.manufacturer_max_area,
            },
        ));
    }

    if !fits(width, height, limits.manufacturer_max) {
        report.add(PanelIssue::warning(
            IssueCode::ExceedsManufacturerDimensions,
            "Panel is larger than the manufacturer's maximum panel size",
            dimensions_context(width, height, limits.manufacturer_max),
        ));
    }

    for issue in &report.issues {
        log::warn!("{}: {}", issue.context, issue.message);
    }

    report
}

fn fits(width: f64, height: f64, (max_x, max_y): (f64, f64)) -> bool {
    (width <= max_x && height <= max_y) || (width <= max_y && height <= max_x)
}

fn dimensions_context(width: f64, height: f64, (max_x, max_y): (f64, f64)) -> IssueContext {
    IssueContext::Dimensions {
        width,
        height,
        max_x,
        max_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> DimensionLimits {
        DimensionLimits {
            configured_max: (100.0, 50.0),
            manufacturer_max: (200.0, 150.0),
            manufacturer_max_area: 0.25,
            show_area_warning: true,
        }
    }

    #[test]
    fn small_panel_is_clean() {
        let report = validate_dimensions(56.0, 46.0, 0.2576 - 0.01, &limits());
        assert!(report.is_clean(), "unexpected: {:?}", report.issues);
    }

    #[test]
    fn rotated_panel_still_fits() {
        let report = validate_dimensions(50.0, 100.0, 0.05, &limits());
        assert!(report.is_clean());
    }

    #[test]
    fn checks_run_in_order() {
        let report = validate_dimensions(250.0, 160.0, 4.0, &limits());
        let codes: Vec<IssueCode> = report.issues.iter().map(|i| i.code).collect();
        assert_eq!(
            codes,
            vec![
                IssueCode::ExceedsConfiguredDimensions,
                IssueCode::ExceedsSurfaceArea,
                IssueCode::ExceedsManufacturerDimensions,
            ]
        );
    }

    #[test]
    fn area_warning_can_be_disabled() {
        let mut limits = limits();
        limits.show_area_warning = false;
        let report = validate_dimensions(90.0, 40.0, 4.0, &limits);
        assert!(report.is_clean());
    }

    #[test]
    fn every_issue_counts_as_a_warning() {
        let report = validate_dimensions(250.0, 160.0, 4.0, &limits());
        assert_eq!(report.warning_count(), report.issues.len());
        let text = report.to_string();
        assert!(text.starts_with("Panel checks completed with 3 warning(s):"));
        assert!(text.contains("  [WARN] ExceedsSurfaceArea (4dm² vs 0.25dm²): "));
    }

    #[test]
    fn dimension_context_carries_values() {
        let report = validate_dimensions(120.0, 40.0, 0.048, &limits());
        assert_eq!(report.warning_count(), 1);
        assert_eq!(
            report.issues[0].context,
            IssueContext::Dimensions {
                width: 120.0,
                height: 40.0,
                max_x: 100.0,
                max_y: 50.0,
            }
        );
    }
}
