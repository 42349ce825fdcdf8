use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for paneliser operations.
#[derive(Debug, Error)]
pub enum PaneliserError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing config value [{section}] {key}")]
    MissingConfigValue { section: String, key: String },

    #[error("Config value [{section}] {key} = '{value}' is not a valid number or is out of range")]
    MalformedNumericConfig {
        section: String,
        key: String,
        value: String,
    },

    #[error("Failed to parse font definition from {path}: {source}")]
    FontParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write font definition to {path}: {source}")]
    FontWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to import glyph from {path}: {message}")]
    GlyphImport { path: PathBuf, message: String },

    #[error("Letter '{glyph}' not found in font definition")]
    GlyphNotFound { glyph: char },

    #[error("Invalid mousebite code '{code}' (expected <location><alignment>, e.g. 'bc')")]
    InvalidMousebiteCode { code: String },

    #[error("Invalid {axis} repeat {value} (must be at least 1)")]
    InvalidRepeat { axis: char, value: u32 },

    #[error("Repeat {repeat_x} x {repeat_y} is more boards than a panel can hold")]
    TooManyBoards { repeat_x: u32, repeat_y: u32 },

    #[error("Invalid {axis} support bar cadence {value} (must be at least 1)")]
    InvalidSupportBarCadence { axis: char, value: u32 },

    #[error("Failed to parse outline {path}: {message}")]
    OutlineParse { path: PathBuf, message: String },

    #[error("No profile file with extension {extensions:?} found in {path}")]
    ProfileNotFound {
        path: PathBuf,
        extensions: Vec<String>,
    },

    #[error("Zip error in {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to parse gerberset {path}: {message}")]
    GerbersetParse { path: PathBuf, message: String },

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("Panel rejected with {warning_count} warning(s)")]
    PanelRejected {
        warning_count: usize,
        report: ValidationReport,
    },
}
