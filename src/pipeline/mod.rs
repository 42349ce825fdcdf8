//! End-to-end panel job.
//!
//! Reads the board outline, builds and checks the layout, emits the frame
//! overlay, packs it into a zip and writes the gerberset manifest plus the
//! text report next to the input.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use zip::write::SimpleFileOptions;

use crate::config::PanelConfig;
use crate::error::PaneliserError;
use crate::font::VectorFont;
use crate::frame::{self, FrameOutput, FrameRequest, SilkscreenOverflowPolicy};
use crate::gerberset::GerberSetDocument;
use crate::layout::{build_layout, BoardBounds, LayoutRequest, PanelLayout, SupportBarSchedule};
use crate::outline::{read_board_outline, ProfileSource};
use crate::report::PanelReport;
use crate::validation::{validate_layout, DimensionLimits, ValidationReport};

/// Scratch directory for frame files before they are zipped.
pub const TEMP_DIR_NAME: &str = "_paneliser_temp_gerbers";

/// Name of the zipped frame overlay.
pub const FRAME_ZIP_NAME: &str = "panel_frame_overlay.zip";

/// Date strings printed on the frame and in the drill header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameStamp {
    /// Human-readable date, e.g. `18/Oct/2026`.
    pub date: String,
    /// ISO 8601 timestamp.
    pub created: String,
}

impl FrameStamp {
    pub fn now() -> Self {
        Self::from_datetime(Local::now())
    }

    pub fn from_datetime(at: DateTime<Local>) -> Self {
        Self {
            date: at.format("%d/%b/%Y").to_string(),
            created: at.to_rfc3339(),
        }
    }
}

/// Everything needed to run one panel job.
#[derive(Clone, Debug)]
pub struct PanelJob {
    /// Zipped gerber set or bare profile file.
    pub input: PathBuf,
    pub repeat_x: u32,
    pub repeat_y: u32,
    pub mousebite_codes: Vec<String>,
    pub support_bars: SupportBarSchedule,
    pub title: String,
    pub config: PanelConfig,
    pub font: VectorFont,
    pub overflow_policy: SilkscreenOverflowPolicy,
    pub stamp: FrameStamp,
    /// Stop with [`PaneliserError::PanelRejected`] if any warning was raised.
    pub strict: bool,
    /// Compute everything but write nothing.
    pub dry_run: bool,
}

impl PanelJob {
    /// A job with the default config, builtin font and today's date.
    pub fn new(input: impl Into<PathBuf>, repeat_x: u32, repeat_y: u32) -> Result<Self, PaneliserError> {
        Ok(Self {
            input: input.into(),
            repeat_x,
            repeat_y,
            mousebite_codes: Vec::new(),
            support_bars: SupportBarSchedule::none(),
            title: String::new(),
            config: PanelConfig::default(),
            font: VectorFont::builtin()?,
            overflow_policy: SilkscreenOverflowPolicy::default(),
            stamp: FrameStamp::now(),
            strict: false,
            dry_run: false,
        })
    }
}

/// Paths written by a job.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WrittenFiles {
    pub frame_zip: Option<PathBuf>,
    pub export_folder: Option<PathBuf>,
    pub gerberset: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

/// Result of a panel job.
#[derive(Clone, Debug)]
pub struct PanelOutcome {
    pub profile: ProfileSource,
    pub layout: PanelLayout,
    pub frame: FrameOutput,
    pub panel_report: PanelReport,
    /// Every warning raised, in pipeline order.
    pub warnings: ValidationReport,
    pub written: WrittenFiles,
}

/// Runs a panel job from outline to manifest.
pub fn run_panel_job(job: &PanelJob) -> Result<PanelOutcome, PaneliserError> {
    let config = &job.config;

    log::info!("Reading board outline from {}", job.input.display());
    let profile = read_board_outline(&job.input, &config.profile_extensions)?;
    let bounds = BoardBounds::from_outline(&profile.bounds);
    log::info!(
        "PCB dimensions: {}mm x {}mm",
        bounds.size_x,
        bounds.size_y
    );

    let mut warnings = ValidationReport::new();
    let request = LayoutRequest::from_config(config, bounds, job.repeat_x, job.repeat_y)
        .with_mousebites(job.mousebite_codes.iter().cloned())
        .with_support_bars(job.support_bars);
    let layout = build_layout(&request, &mut warnings)?;
    log::info!(
        "Panel dimensions: {}mm x {}mm ({}dm²)",
        layout.width,
        layout.height,
        layout.surface_area
    );

    warnings.extend(validate_layout(&layout, &DimensionLimits::from_config(config)));

    let frame_request = FrameRequest {
        title: job.title.clone(),
        date: job.stamp.date.clone(),
        created: job.stamp.created.clone(),
        overflow_policy: job.overflow_policy,
    };
    let frame = frame::emit_frame(&layout, &job.font, config, &frame_request)?;
    warnings.extend(frame.report.clone());

    let panel_report = PanelReport::new(
        &layout,
        &job.title,
        &job.stamp.date,
        &frame.fiducials,
        &frame.drills,
        config.decimal_precision,
    );

    if job.strict && !warnings.is_clean() {
        return Err(PaneliserError::PanelRejected {
            warning_count: warnings.warning_count(),
            report: warnings,
        });
    }

    let mut outcome = PanelOutcome {
        profile,
        layout,
        frame,
        panel_report,
        warnings,
        written: WrittenFiles::default(),
    };

    if job.dry_run {
        log::info!("Dry run: no files written");
        return Ok(outcome);
    }

    outcome.written = write_outputs(job, &outcome)?;
    Ok(outcome)
}

fn write_outputs(job: &PanelJob, outcome: &PanelOutcome) -> Result<WrittenFiles, PaneliserError> {
    let config = &job.config;
    let base_dir = job.input.parent().unwrap_or_else(|| Path::new(""));
    let stem = job
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("board");

    let temp_dir = base_dir.join(TEMP_DIR_NAME);
    log::debug!("Frame gerber output dir: {}", temp_dir.display());
    fs::create_dir_all(&temp_dir).map_err(PaneliserError::Io)?;
    let frame_files = frame::write_artifacts(&temp_dir, &outcome.frame.artifacts)?;

    let frame_zip = base_dir.join(FRAME_ZIP_NAME);
    zip_files(&frame_files, &frame_zip)?;
    log::info!("Cleaning up tempfiles");
    fs::remove_dir_all(&temp_dir).map_err(PaneliserError::Io)?;

    let export_folder = base_dir.join(&config.default_export_folder_name);
    fs::create_dir_all(&export_folder).map_err(PaneliserError::Io)?;

    let gerberset = base_dir.join(format!("{stem}-panel.gerberset"));
    GerberSetDocument::from_layout(
        &outcome.layout,
        config,
        &job.input,
        Some(&frame_zip),
        &export_folder,
    )
    .write(&gerberset)?;
    log::info!("Gerberset written to {}", gerberset.display());

    let report = base_dir.join(format!("{stem}-panel-report.txt"));
    outcome.panel_report.write(&report)?;
    log::info!("Report written to {}", report.display());

    Ok(WrittenFiles {
        frame_zip: Some(frame_zip),
        export_folder: Some(export_folder),
        gerberset: Some(gerberset),
        report: Some(report),
    })
}

/// Packs `files` into a flat deflated zip at `destination`.
pub fn zip_files(files: &[PathBuf], destination: &Path) -> Result<(), PaneliserError> {
    let zip_err = |source| PaneliserError::Zip {
        path: destination.to_path_buf(),
        source,
    };

    let file = fs::File::create(destination).map_err(PaneliserError::Io)?;
    let mut writer = zip::ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PaneliserError::UnsupportedInput(format!(
                "cannot store {} in a zip archive",
                path.display()
            )))?;
        writer.start_file(name, options).map_err(zip_err)?;
        let contents = fs::read(path).map_err(PaneliserError::Io)?;
        writer.write_all(&contents).map_err(PaneliserError::Io)?;
    }

    writer.finish().map_err(zip_err)?;
    Ok(())
}
