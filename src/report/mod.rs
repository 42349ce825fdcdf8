//! Plain-text panel report.
//!
//! Written next to the gerberset for whoever sets up the assembly machine:
//! it repeats the step and repeat values and gives every fiducial relative
//! to the bottom-left corner of the first board.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::PaneliserError;
use crate::layout::{round_to, PanelLayout, PanelPoint};

/// Report data in print order.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelReport {
    pub title: String,
    pub date: String,
    pub repeat: (u32, u32),
    pub step: (f64, f64),
    pub panel_size: (f64, f64),
    pub panel_area: f64,
    pub board_size: (f64, f64),
    pub board_area: f64,
    /// Fiducials relative to board 0's bottom-left corner.
    pub fiducial_offsets: Vec<PanelPoint>,
    /// Corner drills in panel coordinates.
    pub drills: Vec<PanelPoint>,
}

impl PanelReport {
    pub fn new(
        layout: &PanelLayout,
        title: &str,
        date: &str,
        fiducials: &[PanelPoint],
        drills: &[PanelPoint],
        precision: u32,
    ) -> Self {
        let corner = layout
            .first_board_corner()
            .unwrap_or_else(|| PanelPoint::new(0.0, 0.0));
        let fiducial_offsets = fiducials
            .iter()
            .map(|fid| fid.offset(-corner.x, -corner.y).rounded(precision))
            .collect();

        Self {
            title: title.to_string(),
            date: date.to_string(),
            repeat: (layout.repeat_x, layout.repeat_y),
            step: (
                round_to(layout.step_x, precision),
                round_to(layout.step_y, precision),
            ),
            panel_size: (
                round_to(layout.width, precision),
                round_to(layout.height, precision),
            ),
            panel_area: layout.surface_area,
            board_size: (
                round_to(layout.bounds.size_x, precision),
                round_to(layout.bounds.size_y, precision),
            ),
            board_area: layout.board_surface_area,
            fiducial_offsets,
            drills: drills.to_vec(),
        }
    }

    /// Report lines without terminators.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Panel: {}", self.title),
            format!("Date: {}", self.date),
            String::new(),
            format!("Repeat: {} x {}", self.repeat.0, self.repeat.1),
            format!("Step: {}mm x {}mm", self.step.0, self.step.1),
            String::new(),
            format!(
                "Panel size: {}mm x {}mm ({}dm²)",
                self.panel_size.0, self.panel_size.1, self.panel_area
            ),
            format!(
                "Board size: {}mm x {}mm ({}dm²)",
                self.board_size.0, self.board_size.1, self.board_area
            ),
            String::new(),
            "Fiducials from board 0 bottom-left corner:".to_string(),
        ];
        for (index, offset) in self.fiducial_offsets.iter().enumerate() {
            lines.push(format!("  FID{}: X {} Y {}", index + 1, offset.x, offset.y));
        }
        lines.push(String::new());
        lines.push("Tooling holes:".to_string());
        for (index, drill) in self.drills.iter().enumerate() {
            lines.push(format!("  H{}: X {} Y {}", index + 1, drill.x, drill.y));
        }
        lines
    }

    /// The report with CRLF line endings.
    pub fn to_crlf_string(&self) -> String {
        let mut out = String::new();
        for line in self.lines() {
            out.push_str(&line);
            out.push_str("\r\n");
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<(), PaneliserError> {
        fs::write(path, self.to_crlf_string()).map_err(PaneliserError::Io)
    }
}

impl fmt::Display for PanelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{drill_coords, fiducial_coords};
    use crate::layout::{build_layout, BoardBounds, LayoutRequest};
    use crate::validation::ValidationReport;

    fn report() -> PanelReport {
        let request = LayoutRequest::new(BoardBounds::new(20.0, 15.0, 0.0, 0.0), 2, 2);
        let layout = build_layout(&request, &mut ValidationReport::new()).expect("layout");
        PanelReport::new(
            &layout,
            "DEMO",
            "18/Oct/2026",
            &fiducial_coords(&layout, 4),
            &drill_coords(&layout, 4),
            4,
        )
    }

    #[test]
    fn fiducials_are_relative_to_first_board() {
        let report = report();
        // First board corner sits at (7, 7).
        assert_eq!(report.fiducial_offsets[0], PanelPoint::new(8.0, -4.5));
        assert_eq!(report.fiducial_offsets[3], PanelPoint::new(39.0, 36.5));
    }

    #[test]
    fn sections_are_in_fixed_order_with_crlf() {
        let text = report().to_crlf_string();
        assert!(text.starts_with("Panel: DEMO\r\nDate: 18/Oct/2026\r\n\r\nRepeat: 2 x 2\r\n"));
        assert!(text.contains("Step: 22mm x 17mm\r\n"));
        assert!(text.contains("Panel size: 56mm x 46mm (0.2576dm²)\r\n"));
        assert!(text.contains("  H1: X 2.5 Y 2.5\r\n"));
        assert!(!text.replace("\r\n", "").contains('\n'));
    }
}
