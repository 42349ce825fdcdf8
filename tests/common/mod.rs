#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A rectangular board profile in `%FSLAX34Y34*%` millimetres.
pub fn rect_outline(min: (f64, f64), max: (f64, f64)) -> String {
    let fixed = |v: f64| (v * 10_000.0).round() as i64;
    let corners = [
        (min.0, min.1),
        (max.0, min.1),
        (max.0, max.1),
        (min.0, max.1),
        (min.0, min.1),
    ];

    let mut text = String::from("G04 board profile*\n%FSLAX34Y34*%\n%MOMM*%\n%ADD10C,0.100000*%\nD10*\nG01*\n");
    for (index, (x, y)) in corners.iter().enumerate() {
        let code = if index == 0 { "D02" } else { "D01" };
        text.push_str(&format!("X{}Y{}{}*\n", fixed(*x), fixed(*y), code));
    }
    text.push_str("M02*\n");
    text
}

/// Writes a zipped gerber set containing a profile layer and a copper layer.
pub fn write_board_zip(path: &Path, profile_name: &str, outline: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    let file = fs::File::create(path).expect("create zip");
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    writer.start_file("board.GTL", options).expect("start copper entry");
    writer
        .write_all(b"G04 copper*\nM02*\n")
        .expect("write copper entry");
    writer.start_file(profile_name, options).expect("start profile entry");
    writer
        .write_all(outline.as_bytes())
        .expect("write profile entry");
    writer.finish().expect("finish zip");
}

/// Creates `<dir>/<name>.zip` holding a `size_x × size_y` board at the origin.
pub fn board_zip(dir: &Path, name: &str, size_x: f64, size_y: f64) -> PathBuf {
    let path = dir.join(format!("{name}.zip"));
    write_board_zip(&path, "board.GKO", &rect_outline((0.0, 0.0), (size_x, size_y)));
    path
}

/// A two-letter font: `I` is a vertical stroke, `L` an L-shape.
pub fn small_font_json() -> &'static str {
    r#"{
  "space_char_width": 0.8,
  "text_letter_gap": 0.25,
  "letters": {
    "I": [
      {"x": 0.0, "y": 1.0, "command": "D02"},
      {"x": 0.0, "y": 0.0, "command": "D01"}
    ],
    "L": {
      "width": 0.6,
      "coords": [
        {"x": 0.0, "y": 1.0, "command": "D02"},
        {"x": 0.0, "y": 0.0, "command": "D01"},
        {"x": 0.6, "y": 0.0, "command": "D01"}
      ]
    }
  }
}
"#
}

/// A single-letter gerber drawing, as exported from a PCB editor.
pub fn letter_drawing() -> &'static str {
    "G04 letter T*\n%FSLAX34Y34*%\n%MOMM*%\n%ADD10C,0.100000*%\nD10*\nX0Y10000D02*\nX6000Y10000D01*\nX3000Y10000D02*\nX3000Y0D01*\nM02*\n"
}
