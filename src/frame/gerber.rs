//! Text codecs for the frame's gerber and excellon files.
//!
//! Coordinates are fixed-point integers: gerber layers use four decimal
//! places (`%FSLAX34Y34*%`, value × 10 000) and the excellon drill file
//! uses three (value × 1 000). Values are truncated, not rounded, which is
//! what the downstream panelizer expects.

use std::fmt::Write as _;

use crate::layout::PanelPoint;

/// Gerber coordinate scale (four decimal digits of mm).
pub const GERBER_SCALE: f64 = 10_000.0;

/// Excellon coordinate scale (three decimal digits of mm).
pub const EXCELLON_SCALE: f64 = 1_000.0;

/// Header shared by every gerber layer of the frame.
pub fn gerber_header(image_name: &str) -> String {
    let mut out = String::new();
    writeln!(out, "G04 Paneliser Gerber RS-274X export*").expect("write to string");
    writeln!(out, "G75*").expect("write to string");
    writeln!(out, "%MOMM*%").expect("write to string");
    writeln!(out, "%FSLAX34Y34*%").expect("write to string");
    writeln!(out, "%LPD*%").expect("write to string");
    writeln!(out, "%IN{}*%", image_name).expect("write to string");
    writeln!(out, "%IPPOS*%").expect("write to string");
    out
}

/// Header of the excellon drill file. `created` is an ISO 8601 timestamp.
pub fn excellon_header(created: &str) -> String {
    let mut out = String::new();
    writeln!(out, "M48").expect("write to string");
    writeln!(
        out,
        ";GenerationSoftware,Paneliser,{}*%",
        env!("CARGO_PKG_VERSION")
    )
    .expect("write to string");
    writeln!(out, ";CreationDate,{}*%", created).expect("write to string");
    writeln!(out, "FMAT,2").expect("write to string");
    writeln!(out, "ICI,OFF").expect("write to string");
    writeln!(out, "METRIC,TZ,000.000").expect("write to string");
    out
}

/// Circular aperture definition, e.g. `%ADD10C,1.000000*%`.
pub fn aperture_definition(code: u32, diameter: f64) -> String {
    format!("%ADD{}C,{:.6}*%", code, diameter)
}

/// Converts mm to a truncated fixed-point integer.
#[inline]
pub fn fixed_point(value: f64, scale: f64) -> i64 {
    (value * scale) as i64
}

/// Gerber coordinate statement such as `X150000Y25000D03*`.
pub fn gerber_statement(x: f64, y: f64, code: &str) -> String {
    format!(
        "X{}Y{}{}*",
        fixed_point(x, GERBER_SCALE),
        fixed_point(y, GERBER_SCALE),
        code
    )
}

/// Excellon hit such as `X2500Y2500`.
pub fn excellon_statement(point: PanelPoint) -> String {
    format!(
        "X{}Y{}",
        fixed_point(point.x, EXCELLON_SCALE),
        fixed_point(point.y, EXCELLON_SCALE)
    )
}

/// A gerber layer that flashes one aperture per group of points.
///
/// Each group is `(aperture diameter, points)`; apertures are numbered from
/// D10 in order.
pub fn flash_layer(image_name: &str, groups: &[(f64, &[PanelPoint])]) -> String {
    let mut out = gerber_header(image_name);
    writeln!(out, "G01*").expect("write to string");
    for (index, (diameter, _)) in groups.iter().enumerate() {
        writeln!(out, "{}", aperture_definition(10 + index as u32, *diameter))
            .expect("write to string");
    }
    writeln!(out).expect("write to string");

    for (index, (_, points)) in groups.iter().enumerate() {
        writeln!(out, "D{}*", 10 + index).expect("write to string");
        for point in points.iter() {
            writeln!(out, "{}", gerber_statement(point.x, point.y, "D03")).expect("write to string");
        }
    }

    writeln!(out, "M02*").expect("write to string");
    out
}

/// Excellon drill file with a single tool.
pub fn drill_file(created: &str, diameter: f64, points: &[PanelPoint]) -> String {
    let mut out = excellon_header(created);
    writeln!(out, "T1C{:.3}", diameter).expect("write to string");
    writeln!(out, "%").expect("write to string");
    writeln!(out, "G90").expect("write to string");
    writeln!(out, "M71").expect("write to string");
    writeln!(out, "T1").expect("write to string");
    for point in points {
        writeln!(out, "{}", excellon_statement(*point)).expect("write to string");
    }
    writeln!(out, "M30").expect("write to string");
    out
}

/// Empty profile layer; the panelizer only needs the file to exist.
pub fn blank_profile(image_name: &str) -> String {
    let mut out = gerber_header(image_name);
    writeln!(out, "G01*").expect("write to string");
    writeln!(out, "M02*").expect("write to string");
    out
}
