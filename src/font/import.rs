//! Import a glyph from a gerber drawing of a single character.
//!
//! The drawing is expected in `%FSLAX34Y34*%` millimetre format with one
//! `X<int>Y<int>D0n*` statement per line, as produced by most PCB editors
//! when exporting a silkscreen-only layer.

use std::fs;
use std::path::Path;

use super::{DrawCommand, DrawOp, Glyph};
use crate::error::PaneliserError;

/// Fixed-point scale of the drawing's coordinates.
const COORDINATE_SCALE: f64 = 10_000.0;

/// Reads a glyph from a gerber file.
pub fn glyph_from_gerber_file(path: &Path) -> Result<Glyph, PaneliserError> {
    let text = fs::read_to_string(path).map_err(PaneliserError::Io)?;
    glyph_from_gerber_str(&text, path)
}

/// Builds a glyph from the coordinate lines of a gerber drawing.
///
/// `path` is only used in error messages.
pub fn glyph_from_gerber_str(text: &str, path: &Path) -> Result<Glyph, PaneliserError> {
    let mut coords = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if !line.starts_with('X') {
            continue;
        }
        log::debug!("Parsing line: {}", line);

        let bad_line = |what: &str| PaneliserError::GlyphImport {
            path: path.to_path_buf(),
            message: format!("line {}: {} in '{}'", line_no + 1, what, line),
        };

        let x = integer_field(line, 'X').ok_or_else(|| bad_line("missing X coordinate"))?;
        let y = integer_field(line, 'Y').ok_or_else(|| bad_line("missing Y coordinate"))?;
        let command = line
            .find('D')
            .map(|start| line[start..].trim_end_matches('*'))
            .and_then(DrawCommand::from_code)
            .ok_or_else(|| bad_line("missing or unsupported D code"))?;

        coords.push(DrawOp {
            x: x as f64 / COORDINATE_SCALE,
            y: y as f64 / COORDINATE_SCALE,
            command,
        });
    }

    if coords.is_empty() {
        return Err(PaneliserError::GlyphImport {
            path: path.to_path_buf(),
            message: "drawing contains no coordinate lines".to_string(),
        });
    }

    log::debug!("Draw coords: {:?}", coords);
    Ok(Glyph::new(coords))
}

/// Fuzz-only entrypoint for glyph drawing parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_glyph(input: &str) -> Result<(), PaneliserError> {
    let _ = glyph_from_gerber_str(input, Path::new("<fuzz>"))?;
    Ok(())
}

fn integer_field(line: &str, axis: char) -> Option<i64> {
    let start = line.find(axis)? + 1;
    let rest = &line[start..];
    let end = rest
        .char_indices()
        .find(|&(idx, c)| !(c.is_ascii_digit() || (c == '-' && idx == 0)))
        .map(|(idx, _)| idx)
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}
