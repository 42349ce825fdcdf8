//! Paneliser: step-and-repeat panels for PCB gerber sets.
//!
//! Paneliser takes a single board's gerber set, lays out a grid of copies
//! with mousebite break tabs between them, and writes everything the
//! external panel merging tool needs: a `.gerberset` placement manifest and
//! a zipped frame overlay carrying fiducials, tooling holes and labels.
//!
//! # Modules
//!
//! - [`layout`]: Board grid, support bars and mousebite placement
//! - [`validation`]: Panel size checks and the warning report
//! - [`frame`]: Frame overlay gerber and excellon files
//! - [`font`]: Stroke font used for frame text
//! - [`gerberset`]: Placement manifest reader and writer
//! - [`outline`]: Board outline reader
//! - [`pipeline`]: The end-to-end panel job
//! - [`error`]: Error types for paneliser operations

pub mod config;
pub mod error;
pub mod font;
pub mod frame;
pub mod gerberset;
pub mod layout;
pub mod outline;
pub mod pipeline;
pub mod report;
pub mod validation;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

pub use config::PanelConfig;
pub use error::PaneliserError;
pub use font::VectorFont;
pub use frame::SilkscreenOverflowPolicy;
pub use layout::{build_layout, BoardBounds, LayoutRequest, PanelLayout, SupportBarSchedule};
pub use pipeline::{run_panel_job, PanelJob, PanelOutcome};

/// The paneliser CLI application.
#[derive(Parser)]
#[command(name = "paneliser")]
#[command(version, author, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show debug output (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build a panel from a zipped gerber set or a profile file.
    Panelise(PaneliseArgs),
    /// Print the bounding box of a board outline.
    Bounds(BoundsArgs),
    /// Maintain a font definition file.
    #[command(subcommand)]
    Font(FontCommands),
}

/// Arguments for the panelise subcommand.
#[derive(clap::Args)]
struct PaneliseArgs {
    /// Zipped gerber set, or the board's profile layer.
    input: PathBuf,

    /// Number of boards along X.
    #[arg(long)]
    repeat_x: u32,

    /// Number of boards along Y.
    #[arg(long)]
    repeat_y: u32,

    /// Comma-separated mousebite codes, location then alignment (e.g. 'bc,tc').
    #[arg(long, value_delimiter = ',')]
    mousebites: Vec<String>,

    /// Insert a vertical support bar after every N columns.
    #[arg(long)]
    bars_x: Option<u32>,

    /// Insert a horizontal support bar after every N rows.
    #[arg(long)]
    bars_y: Option<u32>,

    /// Title printed on the frame (defaults to the input file name).
    #[arg(long)]
    title: Option<String>,

    /// YAML config file.
    #[arg(long, env = "PANELISER_CONFIG")]
    config: Option<PathBuf>,

    /// Font definition JSON (defaults to the builtin font).
    #[arg(long)]
    font: Option<PathBuf>,

    /// What to do when frame text would overlap a fiducial.
    #[arg(long, value_enum, default_value_t = OverflowArg::Emit)]
    silkscreen_overflow: OverflowArg,

    /// Treat warnings as errors and write nothing if any are raised.
    #[arg(long)]
    strict: bool,

    /// Compute and report without writing files.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OverflowArg {
    Emit,
    Skip,
}

impl From<OverflowArg> for SilkscreenOverflowPolicy {
    fn from(arg: OverflowArg) -> Self {
        match arg {
            OverflowArg::Emit => SilkscreenOverflowPolicy::Emit,
            OverflowArg::Skip => SilkscreenOverflowPolicy::Skip,
        }
    }
}

/// Arguments for the bounds subcommand.
#[derive(clap::Args)]
struct BoundsArgs {
    /// Zipped gerber set, or the board's profile layer.
    input: PathBuf,

    /// YAML config file.
    #[arg(long, env = "PANELISER_CONFIG")]
    config: Option<PathBuf>,
}

/// Font maintenance subcommands.
#[derive(Subcommand)]
enum FontCommands {
    /// Recompute every glyph width and save the font.
    Widths {
        /// Font definition JSON.
        font: PathBuf,
    },
    /// Import a glyph from a single-letter gerber drawing.
    AddGlyph {
        /// Font definition JSON.
        font: PathBuf,
        /// Gerber drawing of the letter.
        gerber: PathBuf,
        /// The character the drawing represents.
        #[arg(long = "char")]
        letter: char,
        /// Replace the glyph if the font already has it.
        #[arg(long)]
        overwrite: bool,
    },
}

/// Run the paneliser CLI with arguments from the environment.
pub fn run() -> Result<(), PaneliserError> {
    run_cli(Cli::parse())
}

/// Run an already-parsed command line.
///
/// `main.rs` parses first so it can configure logging from `--verbose`.
pub fn run_cli(cli: Cli) -> Result<(), PaneliserError> {
    match cli.command {
        Some(Commands::Panelise(args)) => run_panelise(args),
        Some(Commands::Bounds(args)) => run_bounds(args),
        Some(Commands::Font(command)) => run_font(command),
        None => {
            println!("paneliser {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Step-and-repeat PCB panel builder.");
            println!();
            println!("Run 'paneliser --help' for usage information.");
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PanelConfig, PaneliserError> {
    match path {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            PanelConfig::load(path)
        }
        None => Ok(PanelConfig::default()),
    }
}

/// Execute the panelise subcommand.
fn run_panelise(args: PaneliseArgs) -> Result<(), PaneliserError> {
    let config = load_config(args.config.as_deref())?;
    let font = match &args.font {
        Some(path) => VectorFont::load(path)?,
        None => VectorFont::builtin()?,
    };
    let title = args.title.clone().unwrap_or_else(|| {
        args.input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let mut job = PanelJob::new(args.input.clone(), args.repeat_x, args.repeat_y)?;
    job.mousebite_codes = args
        .mousebites
        .iter()
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .collect();
    job.support_bars = SupportBarSchedule {
        every_n_x: args.bars_x,
        every_n_y: args.bars_y,
    };
    job.title = title;
    job.config = config;
    job.font = font;
    job.overflow_policy = args.silkscreen_overflow.into();
    job.strict = args.strict;
    job.dry_run = args.dry_run;

    let outcome = match run_panel_job(&job) {
        Ok(outcome) => outcome,
        Err(err) => {
            if let PaneliserError::PanelRejected { report, .. } = &err {
                print!("{}", report);
            }
            return Err(err);
        }
    };

    print!("{}", outcome.panel_report);
    println!();
    print!("{}", outcome.warnings);

    let written = &outcome.written;
    for path in [&written.frame_zip, &written.gerberset, &written.report]
        .into_iter()
        .flatten()
    {
        println!("Wrote {}", path.display());
    }
    if args.dry_run {
        println!("Dry run: no files written");
    }

    Ok(())
}

/// Execute the bounds subcommand.
fn run_bounds(args: BoundsArgs) -> Result<(), PaneliserError> {
    let config = load_config(args.config.as_deref())?;
    let profile = outline::read_board_outline(&args.input, &config.profile_extensions)?;
    let bounds = BoardBounds::from_outline(&profile.bounds);

    if let Some(entry) = &profile.entry {
        println!("Profile: {}", entry);
    }
    println!("Units: {:?}", profile.bounds.units);
    println!(
        "Size: {}mm x {}mm",
        layout::round_to(bounds.size_x, config.decimal_precision),
        layout::round_to(bounds.size_y, config.decimal_precision)
    );
    println!(
        "Origin offset: {}, {}",
        layout::round_to(bounds.origin_x, config.decimal_precision),
        layout::round_to(bounds.origin_y, config.decimal_precision)
    );
    Ok(())
}

/// Execute a font subcommand.
fn run_font(command: FontCommands) -> Result<(), PaneliserError> {
    match command {
        FontCommands::Widths { font: path } => {
            let mut font = VectorFont::load(&path)?;
            font.recompute_widths();
            font.save(&path)?;
            println!(
                "Updated widths of {} glyph(s) in {}",
                font.letters().count(),
                path.display()
            );
            Ok(())
        }
        FontCommands::AddGlyph {
            font: path,
            gerber,
            letter,
            overwrite,
        } => {
            let mut font = VectorFont::load(&path)?;
            let glyph = font::import::glyph_from_gerber_file(&gerber)?;
            if font.insert_glyph(letter, glyph, overwrite) {
                font.save(&path)?;
                println!("Added '{}' to {}", letter, path.display());
            } else {
                log::warn!("Letter '{}' already exists in the font", letter);
                println!(
                    "'{}' already exists in {}; pass --overwrite to replace it",
                    letter,
                    path.display()
                );
            }
            Ok(())
        }
    }
}
