//! Warning report types for structured panel checks.
//!
//! Every check in the pipeline is non-fatal: it produces a [`PanelIssue`]
//! that the caller can display, log, or promote to a failure in strict mode.

use std::fmt;

use crate::layout::Axis;

/// Warnings collected while building and checking a panel.
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    /// All issues found, in the order they were raised.
    pub issues: Vec<PanelIssue>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: PanelIssue) {
        self.issues.push(issue);
    }

    /// Appends every issue from `other`.
    pub fn extend(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues.len()
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if an issue with `code` was raised.
    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Panel checks passed: no warnings");
        }

        writeln!(
            f,
            "Panel checks completed with {} warning(s):",
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single panel warning. Panel checks never block output.
#[derive(Clone, Debug)]
pub struct PanelIssue {
    /// A stable code for the issue type.
    pub code: IssueCode,

    /// A human-readable description of the issue.
    pub message: String,

    /// The values that triggered the issue.
    pub context: IssueContext,
}

impl PanelIssue {
    /// Creates a new warning.
    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self {
            code,
            message: message.into(),
            context,
        }
    }
}

impl fmt::Display for PanelIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[WARN] {:?} ({}): {}",
            self.code, self.context, self.message
        )
    }
}

/// A stable code identifying the type of panel issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueCode {
    // Dimension checks
    /// The panel exceeds the user's configured maximum size.
    ExceedsConfiguredDimensions,
    /// The panel surface area exceeds the manufacturer's standard area.
    ExceedsSurfaceArea,
    /// The panel exceeds the manufacturer's maximum size.
    ExceedsManufacturerDimensions,

    // Layout issues
    /// A mousebite code was not recognised and was dropped.
    InvalidMousebiteCode,
    /// Support bars do not divide the array into equal groups.
    UnevenSupportBarSpacing,

    // Frame issues
    /// Silkscreen text runs past the usable frame width.
    SilkscreenOverflow,
}

/// The values behind a panel issue.
#[derive(Clone, Debug, PartialEq)]
pub enum IssueContext {
    /// Panel size compared against a maximum size.
    Dimensions {
        width: f64,
        height: f64,
        max_x: f64,
        max_y: f64,
    },
    /// Panel area compared against a maximum area (dm²).
    Area { area: f64, max_area: f64 },
    /// The offending mousebite code.
    Mousebite { code: String },
    /// Support bar cadence along one axis.
    SupportBars { axis: Axis, repeat: u32, every: u32 },
    /// Rightmost silkscreen extent compared against the usable width.
    Silkscreen { extent: f64, limit: f64 },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Dimensions {
                width,
                height,
                max_x,
                max_y,
            } => write!(f, "{}mm x {}mm vs {}mm x {}mm", width, height, max_x, max_y),
            IssueContext::Area { area, max_area } => {
                write!(f, "{}dm² vs {}dm²", area, max_area)
            }
            IssueContext::Mousebite { code } => write!(f, "mousebite '{}'", code),
            IssueContext::SupportBars {
                axis,
                repeat,
                every,
            } => write!(f, "{} axis, {} boards, bar every {}", axis, repeat, every),
            IssueContext::Silkscreen { extent, limit } => {
                write!(f, "text to {:.2}mm, limit {:.2}mm", extent, limit)
            }
        }
    }
}
