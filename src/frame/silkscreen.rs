//! Silkscreen labels on the bottom edge of the frame.
//!
//! The title and date sit in a left column starting at 25.4mm. The repeat
//! and step labels sit in a second column placed 5mm to the right of the
//! longer of the first two. An optional order-number placeholder is centred
//! on the top edge.

use std::fmt::Write as _;

use super::gerber::{gerber_header, gerber_statement};
use crate::error::PaneliserError;
use crate::font::VectorFont;
use crate::layout::{round_to, PanelLayout, PanelPoint};

/// Height of silkscreen text (mm).
pub const TEXT_SIZE: f64 = 1.2;

/// Stroke width as a percentage of the text height.
pub const TEXT_RATIO: f64 = 10.0;

const LEFT_COLUMN_X: f64 = 25.4;
const UPPER_ROW_Y: f64 = 5.3;
const LOWER_ROW_Y: f64 = 2.6;
const COLUMN_GAP: f64 = 5.0;

/// What a label shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelRole {
    Title,
    Date,
    Repeat,
    Step,
    OrderNumber,
}

/// A string positioned on the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLabel {
    pub role: LabelRole,
    pub text: String,
    /// Bottom-left of the first glyph.
    pub origin: PanelPoint,
    /// Measured length of the text (mm).
    pub length: f64,
}

/// Positioned labels plus the overflow check result.
#[derive(Clone, Debug, PartialEq)]
pub struct SilkscreenPlan {
    pub labels: Vec<TextLabel>,
    /// Rightmost X reached by any label.
    pub extent: f64,
    /// Leftmost X reached by any label.
    pub start: f64,
    /// Rightmost X the text may reach.
    pub limit: f64,
}

impl SilkscreenPlan {
    /// True when the text would run into the right-hand fiducial or off the
    /// left edge of the panel.
    pub fn overflows(&self) -> bool {
        self.extent > self.limit || self.start < 0.0
    }
}

/// Positions the frame labels and measures how far they reach.
///
/// `limit` is the largest X any label may reach. Fails with
/// [`PaneliserError::GlyphNotFound`] if any label uses a character the
/// font lacks.
pub fn plan_labels(
    layout: &PanelLayout,
    font: &VectorFont,
    title: &str,
    date: &str,
    placeholder: Option<&str>,
    limit: f64,
) -> Result<SilkscreenPlan, PaneliserError> {
    let repeat = format!("Repeat: {} x {}", layout.repeat_x, layout.repeat_y);
    let step = format!(
        "Step: {}mm x {}mm",
        round_to(layout.step_x, 4),
        round_to(layout.step_y, 4)
    );

    let title_len = font.measure(title, TEXT_SIZE)?;
    let date_len = font.measure(date, TEXT_SIZE)?;
    let repeat_len = font.measure(&repeat, TEXT_SIZE)?;
    let step_len = font.measure(&step, TEXT_SIZE)?;

    let right_column_x = LEFT_COLUMN_X + title_len.max(date_len) + COLUMN_GAP;
    let upper_y = UPPER_ROW_Y - TEXT_SIZE / 2.0;
    let lower_y = LOWER_ROW_Y - TEXT_SIZE / 2.0;

    let mut labels = vec![
        TextLabel {
            role: LabelRole::Title,
            text: title.to_string(),
            origin: PanelPoint::new(LEFT_COLUMN_X, upper_y),
            length: title_len,
        },
        TextLabel {
            role: LabelRole::Date,
            text: date.to_string(),
            origin: PanelPoint::new(LEFT_COLUMN_X, lower_y),
            length: date_len,
        },
        TextLabel {
            role: LabelRole::Repeat,
            text: repeat,
            origin: PanelPoint::new(right_column_x, upper_y),
            length: repeat_len,
        },
        TextLabel {
            role: LabelRole::Step,
            text: step,
            origin: PanelPoint::new(right_column_x, lower_y),
            length: step_len,
        },
    ];

    if let Some(text) = placeholder {
        let length = font.measure(text, TEXT_SIZE)?;
        labels.push(TextLabel {
            role: LabelRole::OrderNumber,
            text: text.to_string(),
            origin: PanelPoint::new(
                layout.width / 2.0 - length / 2.0,
                layout.height - layout.frame_width / 2.0 - TEXT_SIZE / 2.0,
            ),
            length,
        });
    }

    let extent = labels
        .iter()
        .map(|label| label.origin.x + label.length)
        .fold(f64::MIN, f64::max);
    let start = labels
        .iter()
        .map(|label| label.origin.x)
        .fold(f64::MAX, f64::min);
    log::debug!("Silk X range: {}..{}", start, extent);

    Ok(SilkscreenPlan {
        labels,
        extent,
        start,
        limit,
    })
}

/// Writes the silkscreen layer. With `draw_text` false only the header and
/// aperture are written.
pub fn silkscreen_layer(
    image_name: &str,
    plan: &SilkscreenPlan,
    font: &VectorFont,
    draw_text: bool,
) -> Result<String, PaneliserError> {
    let mut out = gerber_header(image_name);
    let aperture = TEXT_SIZE * (TEXT_RATIO / 100.0) - 0.004;
    writeln!(out, "G01*").expect("write to string");
    writeln!(out, "%ADD10C,{:.6}*%", aperture).expect("write to string");
    writeln!(out).expect("write to string");
    writeln!(out, "D10*").expect("write to string");

    if draw_text {
        for label in &plan.labels {
            let rendered = font.render(&label.text, TEXT_SIZE, (label.origin.x, label.origin.y))?;
            for op in &rendered.ops {
                writeln!(out, "{}", gerber_statement(op.x, op.y, op.command.code()))
                    .expect("write to string");
            }
        }
    }

    writeln!(out, "M02*").expect("write to string");
    Ok(out)
}
