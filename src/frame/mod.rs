//! Frame overlay emitter.
//!
//! The frame is the border around the board array. It carries four
//! fiducials, four corner tooling holes and the silkscreen labels, written
//! as a small gerber set that the external panelizer merges on top of the
//! boards.

pub mod gerber;
pub mod silkscreen;

pub use silkscreen::{LabelRole, SilkscreenPlan, TextLabel, TEXT_SIZE};

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PanelConfig;
use crate::error::PaneliserError;
use crate::font::VectorFont;
use crate::layout::{PanelLayout, PanelPoint};
use crate::validation::{IssueCode, IssueContext, PanelIssue, ValidationReport};

/// Fiducial copper dot diameter (mm).
pub const FIDUCIAL_DIAMETER: f64 = 1.0;
/// Soldermask opening around a fiducial (mm).
pub const FIDUCIAL_SOLDERMASK_DIAMETER: f64 = 2.5;
/// Soldermask opening around a corner drill (mm).
pub const DRILL_SOLDERMASK_DIAMETER: f64 = 3.2032;
/// Corner tooling hole diameter (mm).
pub const DRILL_DIAMETER: f64 = 3.0;

const FIDUCIAL_LEFT_X: f64 = 15.0;
const FIDUCIAL_RIGHT_INSET: f64 = 10.0;

/// What to do when the silkscreen text would overlap a fiducial.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SilkscreenOverflowPolicy {
    /// Write the text anyway and warn.
    #[default]
    Emit,
    /// Leave the silkscreen layer without text and warn.
    Skip,
}

/// Caller-supplied inputs of the frame emitter.
#[derive(Clone, Debug)]
pub struct FrameRequest {
    pub title: String,
    /// Date printed on the frame, e.g. `18/Oct/2026`.
    pub date: String,
    /// ISO 8601 timestamp written into the drill file header.
    pub created: String,
    pub overflow_policy: SilkscreenOverflowPolicy,
}

/// Layer kind of a frame file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    TopCopper,
    BottomCopper,
    TopSoldermask,
    BottomSoldermask,
    TopSilkscreen,
    Drills,
    Profile,
}

/// One frame file and the coordinates written to it.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameArtifact {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub contents: String,
    pub coords: Vec<PanelPoint>,
}

/// Everything the frame emitter produced.
#[derive(Clone, Debug)]
pub struct FrameOutput {
    pub artifacts: Vec<FrameArtifact>,
    pub fiducials: Vec<PanelPoint>,
    pub drills: Vec<PanelPoint>,
    pub silkscreen: SilkscreenPlan,
    /// Whether the silkscreen text was written.
    pub silkscreen_written: bool,
    pub report: ValidationReport,
}

/// Fiducial centres: bottom pair then top pair, left before right.
pub fn fiducial_coords(layout: &PanelLayout, precision: u32) -> Vec<PanelPoint> {
    let half_frame = layout.frame_width / 2.0;
    let right_x = layout.width - FIDUCIAL_RIGHT_INSET;
    let top_y = layout.height - half_frame;
    vec![
        PanelPoint::new(FIDUCIAL_LEFT_X, half_frame).rounded(precision),
        PanelPoint::new(right_x, half_frame).rounded(precision),
        PanelPoint::new(FIDUCIAL_LEFT_X, top_y).rounded(precision),
        PanelPoint::new(right_x, top_y).rounded(precision),
    ]
}

/// Corner tooling holes, inset by half the frame width from each corner.
pub fn drill_coords(layout: &PanelLayout, precision: u32) -> Vec<PanelPoint> {
    let inset = layout.frame_width / 2.0;
    let right_x = layout.width - inset;
    let top_y = layout.height - inset;
    vec![
        PanelPoint::new(inset, inset).rounded(precision),
        PanelPoint::new(right_x, inset).rounded(precision),
        PanelPoint::new(inset, top_y).rounded(precision),
        PanelPoint::new(right_x, top_y).rounded(precision),
    ]
}

/// Generates every frame file in memory.
///
/// Fails with [`PaneliserError::GlyphNotFound`] if a label uses a letter
/// the font lacks; nothing is produced in that case.
pub fn emit_frame(
    layout: &PanelLayout,
    font: &VectorFont,
    config: &PanelConfig,
    request: &FrameRequest,
) -> Result<FrameOutput, PaneliserError> {
    let precision = config.decimal_precision;
    let names = &config.filenames;
    let fiducials = fiducial_coords(layout, precision);
    let drills = drill_coords(layout, precision);
    log::debug!("Fiducial coords: {:?}", fiducials);
    log::debug!("Drill coords: {:?}", drills);

    let limit = fiducials[1].x - FIDUCIAL_SOLDERMASK_DIAMETER / 2.0;
    let plan = silkscreen::plan_labels(
        layout,
        font,
        &request.title,
        &request.date,
        config.order_number_placeholder.as_deref(),
        limit,
    )?;

    let mut report = ValidationReport::new();
    let draw_text = if plan.overflows() {
        log::warn!(
            "Silkscreen text reaches {:.2}mm, past the fiducial limit of {:.2}mm",
            plan.extent,
            plan.limit
        );
        report.add(PanelIssue::warning(
            IssueCode::SilkscreenOverflow,
            "Silkscreen text would overlap the right-hand fiducial or run off the panel; increase the panel width or shorten the labels",
            IssueContext::Silkscreen {
                extent: plan.extent,
                limit: plan.limit,
            },
        ));
        request.overflow_policy == SilkscreenOverflowPolicy::Emit
    } else {
        true
    };

    let copper = gerber::flash_layer("fiducials", &[(FIDUCIAL_DIAMETER, &fiducials[..])]);
    let soldermask = gerber::flash_layer(
        "soldermask",
        &[
            (FIDUCIAL_SOLDERMASK_DIAMETER, &fiducials[..]),
            (DRILL_SOLDERMASK_DIAMETER, &drills[..]),
        ],
    );
    let mask_coords: Vec<PanelPoint> = fiducials.iter().chain(drills.iter()).copied().collect();
    let silkscreen_text = silkscreen::silkscreen_layer("silkscreen", &plan, font, draw_text)?;

    let artifacts = vec![
        FrameArtifact {
            kind: ArtifactKind::TopCopper,
            file_name: names.top_copper.clone(),
            contents: copper.clone(),
            coords: fiducials.clone(),
        },
        FrameArtifact {
            kind: ArtifactKind::BottomCopper,
            file_name: names.bottom_copper.clone(),
            contents: copper,
            coords: fiducials.clone(),
        },
        FrameArtifact {
            kind: ArtifactKind::TopSoldermask,
            file_name: names.top_soldermask.clone(),
            contents: soldermask.clone(),
            coords: mask_coords.clone(),
        },
        FrameArtifact {
            kind: ArtifactKind::BottomSoldermask,
            file_name: names.bottom_soldermask.clone(),
            contents: soldermask,
            coords: mask_coords,
        },
        FrameArtifact {
            kind: ArtifactKind::TopSilkscreen,
            file_name: names.top_silkscreen.clone(),
            contents: silkscreen_text,
            coords: plan.labels.iter().map(|label| label.origin).collect(),
        },
        FrameArtifact {
            kind: ArtifactKind::Drills,
            file_name: names.drills.clone(),
            contents: gerber::drill_file(&request.created, DRILL_DIAMETER, &drills),
            coords: drills.clone(),
        },
        FrameArtifact {
            kind: ArtifactKind::Profile,
            file_name: names.profile.clone(),
            contents: gerber::blank_profile("profile"),
            coords: Vec::new(),
        },
    ];

    Ok(FrameOutput {
        artifacts,
        fiducials,
        drills,
        silkscreen: plan,
        silkscreen_written: draw_text,
        report,
    })
}

/// Writes each artifact into `dir`, one file at a time, in order.
pub fn write_artifacts(
    dir: &Path,
    artifacts: &[FrameArtifact],
) -> Result<Vec<PathBuf>, PaneliserError> {
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = dir.join(&artifact.file_name);
        fs::write(&path, &artifact.contents).map_err(PaneliserError::Io)?;
        log::debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{build_layout, BoardBounds, LayoutRequest};

    fn layout(size_x: f64, size_y: f64, repeat_x: u32, repeat_y: u32) -> PanelLayout {
        let request = LayoutRequest::new(BoardBounds::new(size_x, size_y, 0.0, 0.0), repeat_x, repeat_y);
        build_layout(&request, &mut ValidationReport::new()).expect("layout")
    }

    fn request(title: &str, policy: SilkscreenOverflowPolicy) -> FrameRequest {
        FrameRequest {
            title: title.to_string(),
            date: "18/Oct/2026".to_string(),
            created: "2026-10-18T12:00:00+00:00".to_string(),
            overflow_policy: policy,
        }
    }

    fn artifact(output: &FrameOutput, kind: ArtifactKind) -> &FrameArtifact {
        output
            .artifacts
            .iter()
            .find(|a| a.kind == kind)
            .expect("artifact present")
    }

    #[test]
    fn fiducials_and_drills_follow_panel_edges() {
        let layout = layout(20.0, 15.0, 2, 2);
        assert_eq!((layout.width, layout.height), (56.0, 46.0));

        let fids = fiducial_coords(&layout, 4);
        assert_eq!(fids[0], PanelPoint::new(15.0, 2.5));
        assert_eq!(fids[1], PanelPoint::new(46.0, 2.5));
        assert_eq!(fids[2], PanelPoint::new(15.0, 43.5));
        assert_eq!(fids[3], PanelPoint::new(46.0, 43.5));

        let drills = drill_coords(&layout, 4);
        assert_eq!(drills[0], PanelPoint::new(2.5, 2.5));
        assert_eq!(drills[3], PanelPoint::new(53.5, 43.5));
    }

    #[test]
    fn drills_do_not_depend_on_repeat_count() {
        let small = layout(20.0, 15.0, 1, 1);
        let large = layout(20.0, 15.0, 5, 3);
        assert_eq!(drill_coords(&small, 4)[0], drill_coords(&large, 4)[0]);
    }

    #[test]
    fn emits_seven_files_with_expected_flashes() {
        let layout = layout(60.0, 40.0, 3, 2);
        let font = VectorFont::builtin().expect("font");
        let output = emit_frame(
            &layout,
            &font,
            &PanelConfig::default(),
            &request("DEMO", SilkscreenOverflowPolicy::Emit),
        )
        .expect("frame");

        assert_eq!(output.artifacts.len(), 7);
        assert!(output.report.is_clean());
        assert!(output.silkscreen_written);

        let copper = artifact(&output, ArtifactKind::TopCopper);
        assert_eq!(copper.file_name, "frame.GTL");
        assert!(copper.contents.contains("%ADD10C,1.000000*%"));
        assert!(copper.contents.contains("X150000Y25000D03*"));
        assert_eq!(copper.contents.matches("D03*").count(), 4);

        let mask = artifact(&output, ArtifactKind::BottomSoldermask);
        assert_eq!(mask.contents.matches("D03*").count(), 8);

        let drills = artifact(&output, ArtifactKind::Drills);
        assert!(drills.contents.contains("X2500Y2500\n"));
        assert!(drills.contents.ends_with("M30\n"));

        let silk = artifact(&output, ArtifactKind::TopSilkscreen);
        assert!(silk.contents.contains("%ADD10C,0.116000*%"));
        assert!(silk.contents.contains("D01*"));
        assert!(silk.contents.ends_with("M02*\n"));
    }

    #[test]
    fn narrow_panel_overflow_respects_policy() {
        let layout = layout(10.0, 10.0, 1, 1);
        let font = VectorFont::builtin().expect("font");
        let config = PanelConfig::default();

        let emitted = emit_frame(
            &layout,
            &font,
            &config,
            &request("A LONG PANEL TITLE", SilkscreenOverflowPolicy::Emit),
        )
        .expect("frame");
        assert!(emitted.silkscreen.overflows());
        assert!(emitted.report.has(IssueCode::SilkscreenOverflow));
        assert!(emitted.silkscreen_written);

        let skipped = emit_frame(
            &layout,
            &font,
            &config,
            &request("A LONG PANEL TITLE", SilkscreenOverflowPolicy::Skip),
        )
        .expect("frame");
        assert!(!skipped.silkscreen_written);
        let silk = artifact(&skipped, ArtifactKind::TopSilkscreen);
        assert!(!silk.contents.contains("D01*"));
        assert!(silk.contents.ends_with("M02*\n"));
    }

    #[test]
    fn missing_glyph_aborts_emission() {
        let layout = layout(60.0, 40.0, 2, 2);
        let font = VectorFont::new(0.8, 0.25);
        let err = emit_frame(
            &layout,
            &font,
            &PanelConfig::default(),
            &request("X", SilkscreenOverflowPolicy::Emit),
        )
        .unwrap_err();
        assert!(matches!(err, PaneliserError::GlyphNotFound { glyph: 'X' }));
    }

    #[test]
    fn placeholder_is_centred_on_top_edge() {
        let layout = layout(60.0, 40.0, 2, 2);
        let font = VectorFont::builtin().expect("font");
        let config = PanelConfig {
            order_number_placeholder: Some("ORDER".to_string()),
            ..PanelConfig::default()
        };
        let output = emit_frame(
            &layout,
            &font,
            &config,
            &request("DEMO", SilkscreenOverflowPolicy::Emit),
        )
        .expect("frame");
        let label = output
            .silkscreen
            .labels
            .iter()
            .find(|l| l.role == LabelRole::OrderNumber)
            .expect("placeholder");
        let centre = label.origin.x + label.length / 2.0;
        assert!((centre - layout.width / 2.0).abs() < 1e-9);
        assert!((label.origin.y - (layout.height - 2.5 - 0.6)).abs() < 1e-9);
    }

    #[test]
    fn long_placeholder_overflows_while_columns_fit() {
        let layout = layout(20.0, 20.0, 4, 1);
        assert_eq!(layout.width, 100.0);
        let font = VectorFont::builtin().expect("font");
        let config = PanelConfig {
            order_number_placeholder: Some("JLC".repeat(40)),
            ..PanelConfig::default()
        };

        let output = emit_frame(
            &layout,
            &font,
            &config,
            &request("DEMO", SilkscreenOverflowPolicy::Skip),
        )
        .expect("frame");

        let step = output
            .silkscreen
            .labels
            .iter()
            .find(|l| l.role == LabelRole::Step)
            .expect("step label");
        assert!(step.origin.x + step.length < output.silkscreen.limit);
        assert!(output.silkscreen.start < 0.0);
        assert!(output.silkscreen.extent > layout.width);
        assert!(output.silkscreen.overflows());
        assert!(output.report.has(IssueCode::SilkscreenOverflow));
        assert!(!output.silkscreen_written);
        assert!(!artifact(&output, ArtifactKind::TopSilkscreen)
            .contents
            .contains("D01*"));
    }

    #[test]
    fn write_artifacts_creates_each_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = layout(60.0, 40.0, 2, 2);
        let font = VectorFont::builtin().expect("font");
        let output = emit_frame(
            &layout,
            &font,
            &PanelConfig::default(),
            &request("DEMO", SilkscreenOverflowPolicy::Emit),
        )
        .expect("frame");
        let written = write_artifacts(dir.path(), &output.artifacts).expect("write");
        assert_eq!(written.len(), 7);
        assert!(dir.path().join("frame.GKO").is_file());
    }
}
