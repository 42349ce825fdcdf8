//! Board outline reader.
//!
//! Finds the profile (outline) layer of a board, either inside a zipped
//! gerber set or as a bare file, and scans its coordinates for the board's
//! bounding box. Only the statements that move the draw position are
//! interpreted; arcs are bounded by their end points.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::PaneliserError;

/// Unit system declared by a gerber file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutlineUnits {
    Metric,
    Imperial,
}

/// Bounding box of an outline in the file's own units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlineBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub units: OutlineUnits,
}

/// The profile layer located for a board.
#[derive(Clone, Debug)]
pub struct ProfileSource {
    /// Archive or file the profile was read from.
    pub path: PathBuf,
    /// Entry name inside the archive, if any.
    pub entry: Option<String>,
    pub bounds: OutlineBounds,
}

/// Reads the profile layer of `path` and returns its bounds.
///
/// `path` may be a `.zip` of gerber files, in which case the first entry
/// whose name ends with one of `extensions` is used, or a profile file.
pub fn read_board_outline(
    path: &Path,
    extensions: &[String],
) -> Result<ProfileSource, PaneliserError> {
    if has_extension(path, ".zip") {
        let (entry, text) = read_profile_from_zip(path, extensions)?;
        log::info!("Profile file name: {}", entry);
        let bounds = parse_outline_str(&text, path)?;
        Ok(ProfileSource {
            path: path.to_path_buf(),
            entry: Some(entry),
            bounds,
        })
    } else if path.is_file() {
        let text = fs::read_to_string(path).map_err(PaneliserError::Io)?;
        let bounds = parse_outline_str(&text, path)?;
        Ok(ProfileSource {
            path: path.to_path_buf(),
            entry: None,
            bounds,
        })
    } else {
        Err(PaneliserError::UnsupportedInput(format!(
            "{} is not a .zip archive or a profile file",
            path.display()
        )))
    }
}

fn read_profile_from_zip(
    path: &Path,
    extensions: &[String],
) -> Result<(String, String), PaneliserError> {
    let zip_err = |source| PaneliserError::Zip {
        path: path.to_path_buf(),
        source,
    };

    let file = fs::File::open(path).map_err(PaneliserError::Io)?;
    let mut archive = zip::ZipArchive::new(file).map_err(zip_err)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(zip_err)?;
        let name = entry.name().to_string();
        log::debug!("File from zip archive: {}", name);

        if !entry.is_dir() && extensions.iter().any(|ext| ends_with_ignore_case(&name, ext)) {
            let mut text = String::new();
            entry
                .read_to_string(&mut text)
                .map_err(PaneliserError::Io)?;
            return Ok((name, text));
        }
    }

    Err(PaneliserError::ProfileNotFound {
        path: path.to_path_buf(),
        extensions: extensions.to_vec(),
    })
}

/// Coordinate format from the `%FS...*%` statement.
#[derive(Clone, Copy, Debug)]
struct CoordinateFormat {
    integer_digits: u32,
    decimal_digits: u32,
    trailing_zeros_omitted: bool,
}

impl Default for CoordinateFormat {
    fn default() -> Self {
        Self {
            integer_digits: 3,
            decimal_digits: 4,
            trailing_zeros_omitted: false,
        }
    }
}

impl CoordinateFormat {
    fn decode(&self, raw: &str) -> Option<f64> {
        if raw.contains('.') {
            return raw.parse::<f64>().ok();
        }

        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let value = if self.trailing_zeros_omitted {
            let width = (self.integer_digits + self.decimal_digits) as usize;
            let padded = format!("{:0<width$}", digits, width = width);
            padded.parse::<f64>().ok()?
        } else {
            digits.parse::<f64>().ok()?
        };

        let value = value / 10f64.powi(self.decimal_digits as i32);
        Some(if negative { -value } else { value })
    }
}

/// Scans gerber text for the bounding box of its drawn coordinates.
///
/// `path` is only used in error messages.
pub fn parse_outline_str(text: &str, path: &Path) -> Result<OutlineBounds, PaneliserError> {
    let parse_err = |message: String| PaneliserError::OutlineParse {
        path: path.to_path_buf(),
        message,
    };

    let mut format = CoordinateFormat::default();
    let mut units = OutlineUnits::Metric;
    let mut current = (0.0_f64, 0.0_f64);
    let mut operation = Operation::Move;
    let mut extent: Option<(f64, f64, f64, f64)> = None;

    for statement in text.split('*').map(str::trim) {
        let statement = statement.trim_start_matches(|c: char| c == '%' || c.is_whitespace());
        if statement.is_empty() {
            continue;
        }

        if let Some(spec) = statement.strip_prefix("FS") {
            format = parse_format_spec(spec).ok_or_else(|| {
                parse_err(format!("unsupported format statement 'FS{}'", spec))
            })?;
            continue;
        }

        match statement {
            "MOMM" | "G71" => {
                units = OutlineUnits::Metric;
                continue;
            }
            "MOIN" | "G70" => {
                units = OutlineUnits::Imperial;
                continue;
            }
            _ => {}
        }

        // Coordinates may follow a G code on the same statement, e.g. G1X..Y..D01
        let Some(body) = strip_g_code(statement) else {
            continue;
        };
        if !(body.starts_with('X') || body.starts_with('Y')) {
            continue;
        }

        let x = coordinate_field(body, 'X');
        let y = coordinate_field(body, 'Y');
        if x.is_none() && y.is_none() {
            continue;
        }

        if let Some(op) = coordinate_field(body, 'D').and_then(Operation::from_code) {
            operation = op;
        }

        let previous = current;
        if let Some(raw) = x {
            current.0 = format
                .decode(raw)
                .ok_or_else(|| parse_err(format!("invalid X coordinate '{}'", raw)))?;
        }
        if let Some(raw) = y {
            current.1 = format
                .decode(raw)
                .ok_or_else(|| parse_err(format!("invalid Y coordinate '{}'", raw)))?;
        }

        match operation {
            Operation::Draw => {
                widen(&mut extent, previous);
                widen(&mut extent, current);
            }
            Operation::Flash => widen(&mut extent, current),
            Operation::Move => {}
        }
    }

    let (min_x, max_x, min_y, max_y) =
        extent.ok_or_else(|| parse_err("outline contains no coordinates".to_string()))?;

    if max_x <= min_x || max_y <= min_y {
        return Err(parse_err(format!(
            "outline has zero size ({} x {})",
            max_x - min_x,
            max_y - min_y
        )));
    }

    log::debug!(
        "Outline bounds: (({}, {}), ({}, {})) {:?}",
        min_x,
        max_x,
        min_y,
        max_y,
        units
    );

    Ok(OutlineBounds {
        min_x,
        max_x,
        min_y,
        max_y,
        units,
    })
}

/// Parses the body of `%FSLAX34Y34*%` (after `FS`).
fn parse_format_spec(spec: &str) -> Option<CoordinateFormat> {
    let mut chars = spec.chars();
    let zeros = chars.next()?;
    let _notation = chars.next()?;
    let rest: String = chars.collect();

    let x_index = rest.find('X')?;
    let x_digits = rest.get(x_index + 1..x_index + 3)?;
    let mut digits = x_digits.chars();
    let integer_digits = digits.next()?.to_digit(10)?;
    let decimal_digits = digits.next()?.to_digit(10)?;

    Some(CoordinateFormat {
        integer_digits,
        decimal_digits,
        trailing_zeros_omitted: zeros == 'T',
    })
}

/// Interpolation operation set by `D01`/`D02`/`D03`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operation {
    Draw,
    Move,
    Flash,
}

impl Operation {
    fn from_code(digits: &str) -> Option<Self> {
        match digits.parse::<u32>().ok()? {
            1 => Some(Operation::Draw),
            2 => Some(Operation::Move),
            3 => Some(Operation::Flash),
            _ => None,
        }
    }
}

fn widen(extent: &mut Option<(f64, f64, f64, f64)>, (x, y): (f64, f64)) {
    *extent = Some(match *extent {
        None => (x, x, y, y),
        Some((min_x, max_x, min_y, max_y)) => (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y)),
    });
}

/// Drops a leading G code of any length. Returns `None` for `G04` comments.
fn strip_g_code(statement: &str) -> Option<&str> {
    let Some(rest) = statement.strip_prefix('G') else {
        return Some(statement);
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Some(statement);
    }
    if rest[..digits].parse::<u32>().ok() == Some(4) {
        return None;
    }
    Some(&rest[digits..])
}

/// Returns the signed digits following `axis` in `body`, if present.
fn coordinate_field(body: &str, axis: char) -> Option<&str> {
    let start = body.find(axis)? + 1;
    let rest = &body[start..];
    let end = rest
        .char_indices()
        .find(|&(idx, c)| !(c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && idx == 0)))
        .map(|(idx, _)| idx)
        .unwrap_or(rest.len());
    Some(&rest[..end]).filter(|field| !field.is_empty())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| ends_with_ignore_case(name, ext))
        .unwrap_or(false)
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name.is_char_boundary(name.len() - suffix.len())
        && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECT_OUTLINE: &str = "G04 Exported from RS-274X tool*
%FSLAX34Y34*%
%MOMM*%
%ADD10C,0.1000*%
D10*
X-50000Y20000D02*
X150000Y20000D01*
Y170000D01*
X-50000D01*
Y20000D01*
M02*
";

    #[test]
    fn rectangle_bounds_in_mm() {
        let bounds = parse_outline_str(RECT_OUTLINE, Path::new("board.gko")).expect("parse");
        assert_eq!(bounds.min_x, -5.0);
        assert_eq!(bounds.max_x, 15.0);
        assert_eq!(bounds.min_y, 2.0);
        assert_eq!(bounds.max_y, 17.0);
        assert_eq!(bounds.units, OutlineUnits::Metric);
    }

    #[test]
    fn imperial_and_trailing_zero_format() {
        let text = "%FSTAX24Y24*%\n%MOIN*%\nX0Y0D02*\nX01Y0D01*\nX01Y005D01*\nM02*\n";
        let bounds = parse_outline_str(text, Path::new("board.gko")).expect("parse");
        assert_eq!(bounds.units, OutlineUnits::Imperial);
        assert!((bounds.max_x - 1.0).abs() < 1e-12);
        assert!((bounds.max_y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn g_code_prefixed_coordinates_are_read() {
        let text = "%FSLAX34Y34*%%MOMM*%G01X0Y0D02*G01X100000Y0D01*G01X100000Y50000D01*M02*";
        let bounds = parse_outline_str(text, Path::new("board.gko")).expect("parse");
        assert_eq!(bounds.max_x, 10.0);
        assert_eq!(bounds.max_y, 5.0);
    }

    #[test]
    fn single_digit_g_codes_are_stripped() {
        let text = "%FSLAX34Y34*%%MOMM*%G1X0Y0D02*G1X100000Y0D01*G1X100000Y50000D01*M02*";
        let bounds = parse_outline_str(text, Path::new("board.gko")).expect("parse");
        assert_eq!(bounds.min_x, 0.0);
        assert_eq!(bounds.max_x, 10.0);
        assert_eq!(bounds.max_y, 5.0);
    }

    #[test]
    fn moves_do_not_widen_bounds() {
        let text = "%FSLAX34Y34*%\n%MOMM*%\nX0Y0D02*\nX100000Y100000D02*\nX300000Y100000D01*\nY250000D01*\nX100000D01*\nY100000D01*\nM02*\n";
        let bounds = parse_outline_str(text, Path::new("board.gko")).expect("parse");
        assert_eq!((bounds.min_x, bounds.max_x), (10.0, 30.0));
        assert_eq!((bounds.min_y, bounds.max_y), (10.0, 25.0));
    }

    #[test]
    fn comment_statements_are_ignored() {
        let text = "G04 X999999Y999999 note*\n%FSLAX34Y34*%\nX0Y0D02*\nX10000Y10000D01*\nM02*\n";
        let bounds = parse_outline_str(text, Path::new("board.gko")).expect("parse");
        assert_eq!((bounds.max_x, bounds.max_y), (1.0, 1.0));
    }

    #[test]
    fn empty_outline_is_an_error() {
        let err = parse_outline_str("%FSLAX34Y34*%\nM02*\n", Path::new("board.gko")).unwrap_err();
        assert!(matches!(err, PaneliserError::OutlineParse { .. }));
    }

    #[test]
    fn reads_profile_from_plain_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("board.gko");
        fs::write(&path, RECT_OUTLINE).expect("write outline");

        let source = read_board_outline(&path, &[".gko".to_string()]).expect("read");
        assert_eq!(source.entry, None);
        assert_eq!(source.bounds.max_x, 15.0);
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(ends_with_ignore_case("Board.GKO", ".gko"));
        assert!(!ends_with_ignore_case("board.gtl", ".gko"));
        assert!(has_extension(Path::new("dir/set.ZIP"), ".zip"));
    }
}
