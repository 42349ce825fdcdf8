//! Stroke font used for silkscreen text on the panel frame.
//!
//! A font is a table of glyphs, each an ordered list of gerber draw
//! operations in font units (1 unit = 1mm at scale 1). Glyphs are packed
//! using their actual drawn extent rather than a fixed advance width, so
//! narrow glyphs like `I` or `.` do not leave gaps.
//!
//! # Example
//!
//! ```
//! use paneliser::font::VectorFont;
//!
//! let font = VectorFont::builtin().unwrap();
//! assert_eq!(font.measure("", 1.2).unwrap(), 0.0);
//! assert_eq!(font.measure(" ", 1.2).unwrap(), font.space_char_width);
//! ```

pub mod import;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PaneliserError;

const BUILTIN_FONT: &str = include_str!("../../assets/vector_font.json");

/// Gerber draw operation for a glyph point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawCommand {
    /// Draw a line to the point with the current aperture.
    #[serde(rename = "D01")]
    Draw,
    /// Move to the point without drawing.
    #[serde(rename = "D02")]
    Move,
    /// Flash the current aperture at the point.
    #[serde(rename = "D03")]
    Flash,
}

impl DrawCommand {
    /// The gerber operation code.
    pub fn code(self) -> &'static str {
        match self {
            DrawCommand::Draw => "D01",
            DrawCommand::Move => "D02",
            DrawCommand::Flash => "D03",
        }
    }

    /// Parses a gerber operation code such as `D01` or `D1`.
    pub fn from_code(code: &str) -> Option<Self> {
        let number = code.strip_prefix('D')?.parse::<u32>().ok()?;
        match number {
            1 => Some(DrawCommand::Draw),
            2 => Some(DrawCommand::Move),
            3 => Some(DrawCommand::Flash),
            _ => None,
        }
    }
}

/// A single point of a glyph, or of rendered text.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawOp {
    pub x: f64,
    pub y: f64,
    pub command: DrawCommand,
}

/// One character of the font.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Glyph {
    /// Horizontal extent of the glyph's points, `max(x) - min(x)`.
    pub width: f64,
    pub coords: Vec<DrawOp>,
}

impl Glyph {
    /// Creates a glyph and computes its width.
    pub fn new(coords: Vec<DrawOp>) -> Self {
        Self {
            width: glyph_width(&coords),
            coords,
        }
    }
}

/// Text rendered to absolute draw operations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedText {
    pub ops: Vec<DrawOp>,
    /// Cursor position after the last character, where following text
    /// would start.
    pub end_x: f64,
}

/// A loaded vector font.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorFont {
    /// Advance used for a space (mm, not scaled).
    pub space_char_width: f64,
    /// Gap between glyphs in font units.
    pub text_letter_gap: f64,
    glyphs: BTreeMap<char, Glyph>,
}

#[derive(Serialize, Deserialize)]
struct FontFile {
    space_char_width: f64,
    text_letter_gap: f64,
    letters: BTreeMap<String, LetterEntry>,
}

/// Letters may be stored with a precomputed width or as bare coordinates.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LetterEntry {
    Measured { width: f64, coords: Vec<DrawOp> },
    Raw(Vec<DrawOp>),
}

impl VectorFont {
    /// Creates a font from its parts.
    pub fn new(space_char_width: f64, text_letter_gap: f64) -> Self {
        Self {
            space_char_width,
            text_letter_gap,
            glyphs: BTreeMap::new(),
        }
    }

    /// The stroke font bundled with paneliser.
    pub fn builtin() -> Result<Self, PaneliserError> {
        Self::from_json_str(BUILTIN_FONT, Path::new("<builtin font>"))
    }

    /// Loads a font definition file.
    pub fn load(path: &Path) -> Result<Self, PaneliserError> {
        log::debug!("Loading font file {}", path.display());
        let text = fs::read_to_string(path).map_err(PaneliserError::Io)?;
        Self::from_json_str(&text, path)
    }

    /// Parses a font definition. `path` is only used in errors.
    pub fn from_json_str(text: &str, path: &Path) -> Result<Self, PaneliserError> {
        let file: FontFile =
            serde_json::from_str(text).map_err(|source| PaneliserError::FontParse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut font = Self::new(file.space_char_width, file.text_letter_gap);
        for (key, entry) in file.letters {
            let mut chars = key.chars();
            let (Some(letter), None) = (chars.next(), chars.next()) else {
                log::warn!("Skipping font entry '{}': not a single character", key);
                continue;
            };

            let glyph = match entry {
                LetterEntry::Measured { width, coords } => Glyph { width, coords },
                LetterEntry::Raw(coords) => Glyph::new(coords),
            };
            font.glyphs.insert(letter, glyph);
        }

        Ok(font)
    }

    /// Writes the font definition as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), PaneliserError> {
        let file = FontFile {
            space_char_width: self.space_char_width,
            text_letter_gap: self.text_letter_gap,
            letters: self
                .glyphs
                .iter()
                .map(|(letter, glyph)| {
                    (
                        letter.to_string(),
                        LetterEntry::Measured {
                            width: glyph.width,
                            coords: glyph.coords.clone(),
                        },
                    )
                })
                .collect(),
        };

        let mut json =
            serde_json::to_string_pretty(&file).map_err(|source| PaneliserError::FontWrite {
                path: path.to_path_buf(),
                source,
            })?;
        json.push('\n');
        fs::write(path, json).map_err(PaneliserError::Io)
    }

    /// Looks up a glyph.
    pub fn glyph(&self, letter: char) -> Option<&Glyph> {
        self.glyphs.get(&letter)
    }

    /// Characters defined by the font, in order.
    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.glyphs.keys().copied()
    }

    /// Adds a glyph. Returns false without changing the font if the letter
    /// already exists and `overwrite` is not set.
    pub fn insert_glyph(&mut self, letter: char, glyph: Glyph, overwrite: bool) -> bool {
        if self.glyphs.contains_key(&letter) && !overwrite {
            return false;
        }
        self.glyphs.insert(letter, glyph);
        true
    }

    /// Recomputes every glyph's width from its coordinates.
    pub fn recompute_widths(&mut self) {
        for (letter, glyph) in self.glyphs.iter_mut() {
            glyph.width = glyph_width(&glyph.coords);
            log::debug!("Letter {} width: {}", letter, glyph.width);
        }
    }

    /// Length of `text` in mm when drawn at `scale`.
    pub fn measure(&self, text: &str, scale: f64) -> Result<f64, PaneliserError> {
        text.chars().try_fold(0.0, |length, letter| {
            if letter == ' ' {
                return Ok(length + self.space_char_width);
            }
            let glyph = self.require(letter)?;
            Ok(length + glyph.width * scale + self.text_letter_gap * scale)
        })
    }

    /// Renders `text` starting at `origin`, trimming surrounding whitespace.
    ///
    /// After each glyph the cursor moves to the glyph's rightmost drawn X
    /// plus the letter gap, so rendering `"ab"` equals rendering `"a"` and
    /// then `"b"` from the returned `end_x`.
    pub fn render(
        &self,
        text: &str,
        scale: f64,
        origin: (f64, f64),
    ) -> Result<RenderedText, PaneliserError> {
        let (mut cursor, y_start) = origin;
        let gap = self.text_letter_gap * scale;
        let mut ops = Vec::new();

        for letter in text.trim().chars() {
            if letter == ' ' {
                cursor += self.space_char_width - gap;
                continue;
            }

            let glyph = self.require(letter)?;
            let mut x_max = cursor;
            for point in &glyph.coords {
                let x = point.x * scale + cursor;
                let y = point.y * scale + y_start;
                x_max = x_max.max(x);
                ops.push(DrawOp {
                    x,
                    y,
                    command: point.command,
                });
            }
            cursor = x_max + gap;
        }

        Ok(RenderedText {
            ops,
            end_x: cursor,
        })
    }

    fn require(&self, letter: char) -> Result<&Glyph, PaneliserError> {
        self.glyphs
            .get(&letter)
            .ok_or(PaneliserError::GlyphNotFound { glyph: letter })
    }
}

fn glyph_width(coords: &[DrawOp]) -> f64 {
    if coords.is_empty() {
        return 0.0;
    }
    let (min, max) = coords
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), point| {
            (min.min(point.x), max.max(point.x))
        });
    (((max - min) * 10_000.0).round()) / 10_000.0
}
