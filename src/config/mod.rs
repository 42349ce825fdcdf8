//! Panel configuration.
//!
//! The configuration file is YAML with three sections (`panel_options`,
//! `fabrication`, `gerber_filenames`). Every scalar is read as text and then
//! parsed, so `2.0`, `"2.0"` and `2` are all accepted for numeric keys.
//! Once loaded, [`PanelConfig`] is immutable and passed by reference into
//! every stage.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_yaml::Value;

use crate::error::PaneliserError;
use crate::layout::MAX_DECIMAL_PRECISION;

const PANEL_OPTIONS: &str = "panel_options";
const FABRICATION: &str = "fabrication";
const GERBER_FILENAMES: &str = "gerber_filenames";

/// Fully-resolved configuration for a panel job.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelConfig {
    /// Router bit diameter, also the clearance between boards (mm).
    pub route_diameter: f64,
    /// Mousebite drill row diameter (mm).
    pub mousebite_diameter: f64,
    /// Decimal places kept for every coordinate and manifest value.
    pub decimal_precision: u32,
    /// Width of the frame surrounding the board array (mm).
    pub frame_width: f64,
    /// Width of a support bar inserted between rows/columns (mm).
    pub support_bar_width: f64,
    /// Largest panel the user wants to produce (mm).
    pub max_panel: (f64, f64),
    /// Largest panel the manufacturer accepts (mm).
    pub manufacturer_max: (f64, f64),
    /// Largest surface area the manufacturer prices normally (dm²).
    pub manufacturer_max_area: f64,
    /// Whether exceeding `manufacturer_max_area` raises a warning.
    pub show_area_warning: bool,
    /// Text printed as the order-number placeholder, if enabled.
    pub order_number_placeholder: Option<String>,
    /// Extensions that identify the board profile file.
    pub profile_extensions: Vec<String>,
    /// Folder created next to the input for panelizer exports.
    pub default_export_folder_name: String,
    /// Names of the frame overlay files.
    pub filenames: FrameFilenames,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            route_diameter: 2.0,
            mousebite_diameter: 0.5,
            decimal_precision: 4,
            frame_width: 5.0,
            support_bar_width: 5.0,
            max_panel: (250.0, 250.0),
            manufacturer_max: (480.0, 480.0),
            manufacturer_max_area: 0.25,
            show_area_warning: true,
            order_number_placeholder: None,
            profile_extensions: vec![".gko".to_string(), ".gm1".to_string()],
            default_export_folder_name: "panel_export".to_string(),
            filenames: FrameFilenames::default(),
        }
    }
}

/// Names of the files making up the frame overlay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameFilenames {
    pub top_copper: String,
    pub bottom_copper: String,
    pub top_soldermask: String,
    pub bottom_soldermask: String,
    pub top_silkscreen: String,
    pub drills: String,
    pub profile: String,
}

impl Default for FrameFilenames {
    fn default() -> Self {
        Self {
            top_copper: "frame.GTL".to_string(),
            bottom_copper: "frame.GBL".to_string(),
            top_soldermask: "frame.GTS".to_string(),
            bottom_soldermask: "frame.GBS".to_string(),
            top_silkscreen: "frame.GTO".to_string(),
            drills: "frame.TXT".to_string(),
            profile: "frame.GKO".to_string(),
        }
    }
}

impl PanelConfig {
    /// Margin handed to the external panelizer's fill step.
    ///
    /// Slightly larger than the route diameter, otherwise odd sized boards
    /// can have their break tabs flagged invalid.
    pub fn fill_offset(&self) -> f64 {
        self.route_diameter + 0.01
    }

    /// Load a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self, PaneliserError> {
        let text = fs::read_to_string(path).map_err(PaneliserError::Io)?;
        Self::from_yaml_str(&text, path)
    }

    /// Parse a configuration from YAML text. `path` is only used in errors.
    pub fn from_yaml_str(text: &str, path: &Path) -> Result<Self, PaneliserError> {
        let raw: BTreeMap<String, BTreeMap<String, Value>> =
            serde_yaml::from_str(text).map_err(|source| PaneliserError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        let sections = RawSections { raw };
        let defaults = FrameFilenames::default();

        let placeholder_enabled =
            sections.parse_bool(FABRICATION, "add_order_number_placeholder")?;
        let placeholder_text = sections
            .optional_text(FABRICATION, "order_number_placeholder_text")
            .unwrap_or_default();

        let config = Self {
            route_diameter: sections.parse_positive_f64(PANEL_OPTIONS, "route_diameter")?,
            mousebite_diameter: sections.parse_positive_f64(PANEL_OPTIONS, "mousebite_diameter")?,
            decimal_precision: sections.parse_precision(PANEL_OPTIONS, "decimal_precision")?,
            frame_width: sections.parse_positive_f64(PANEL_OPTIONS, "frame_width")?,
            support_bar_width: sections.parse_positive_f64(PANEL_OPTIONS, "support_bar_width")?,
            max_panel: (
                sections.parse_positive_f64(PANEL_OPTIONS, "max_panel_x")?,
                sections.parse_positive_f64(PANEL_OPTIONS, "max_panel_y")?,
            ),
            manufacturer_max: (
                sections.parse_positive_f64(FABRICATION, "max_x")?,
                sections.parse_positive_f64(FABRICATION, "max_y")?,
            ),
            manufacturer_max_area: sections.parse_positive_f64(FABRICATION, "max_area")?,
            show_area_warning: sections.parse_bool(FABRICATION, "show_area_warning")?,
            order_number_placeholder: (placeholder_enabled && !placeholder_text.trim().is_empty())
                .then_some(placeholder_text),
            profile_extensions: split_extensions(
                &sections.required_text(PANEL_OPTIONS, "profile_extensions")?,
            ),
            default_export_folder_name: sections
                .required_text(PANEL_OPTIONS, "default_export_folder_name")?,
            filenames: FrameFilenames {
                top_copper: sections.filename("top_copper", defaults.top_copper),
                bottom_copper: sections.filename("bottom_copper", defaults.bottom_copper),
                top_soldermask: sections.filename("top_soldermask", defaults.top_soldermask),
                bottom_soldermask: sections
                    .filename("bottom_soldermask", defaults.bottom_soldermask),
                top_silkscreen: sections.filename("top_silkscreen", defaults.top_silkscreen),
                drills: sections.filename("drills", defaults.drills),
                profile: sections.filename("profile", defaults.profile),
            },
        };

        log::debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}

struct RawSections {
    raw: BTreeMap<String, BTreeMap<String, Value>>,
}

impl RawSections {
    fn optional_text(&self, section: &str, key: &str) -> Option<String> {
        self.raw
            .get(section)
            .and_then(|entries| entries.get(key))
            .and_then(scalar_text)
    }

    fn required_text(&self, section: &str, key: &str) -> Result<String, PaneliserError> {
        self.optional_text(section, key)
            .ok_or_else(|| PaneliserError::MissingConfigValue {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    fn parse_f64(&self, section: &str, key: &str) -> Result<f64, PaneliserError> {
        let raw = self.required_text(section, key)?;
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| malformed(section, key, &raw))
    }

    /// Lengths and areas must be strictly positive.
    fn parse_positive_f64(&self, section: &str, key: &str) -> Result<f64, PaneliserError> {
        let value = self.parse_f64(section, key)?;
        if value > 0.0 {
            Ok(value)
        } else {
            Err(malformed(section, key, &value.to_string()))
        }
    }

    fn parse_precision(&self, section: &str, key: &str) -> Result<u32, PaneliserError> {
        let raw = self.required_text(section, key)?;
        raw.trim()
            .parse::<u32>()
            .ok()
            .filter(|&precision| precision <= MAX_DECIMAL_PRECISION)
            .ok_or_else(|| malformed(section, key, &raw))
    }

    fn parse_bool(&self, section: &str, key: &str) -> Result<bool, PaneliserError> {
        let raw = self.required_text(section, key)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(malformed(section, key, &raw)),
        }
    }

    fn filename(&self, key: &str, default: String) -> String {
        self.optional_text(GERBER_FILENAMES, key)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(default)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn malformed(section: &str, key: &str, raw: &str) -> PaneliserError {
    PaneliserError::MalformedNumericConfig {
        section: section.to_string(),
        key: key.to_string(),
        value: raw.to_string(),
    }
}

fn split_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .map(|ext| {
            if ext.starts_with('.') {
                ext.to_ascii_lowercase()
            } else {
                format!(".{}", ext.to_ascii_lowercase())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
panel_options:
  route_diameter: 2.0
  mousebite_diameter: "0.5"
  decimal_precision: 4
  frame_width: 5
  support_bar_width: 4.5
  max_panel_x: 200
  max_panel_y: 150
  profile_extensions: "gko, GM1"
  default_export_folder_name: export
fabrication:
  max_x: 480
  max_y: 480
  max_area: 0.25
  show_area_warning: "True"
  add_order_number_placeholder: yes
  order_number_placeholder_text: JLCJLCJLCJLC
gerber_filenames:
  top_copper: overlay.GTL
"#;

    #[test]
    fn parses_text_and_numeric_scalars() {
        let config = PanelConfig::from_yaml_str(SAMPLE, Path::new("test.yaml")).expect("parse");
        assert_eq!(config.route_diameter, 2.0);
        assert_eq!(config.mousebite_diameter, 0.5);
        assert_eq!(config.decimal_precision, 4);
        assert_eq!(config.support_bar_width, 4.5);
        assert_eq!(config.max_panel, (200.0, 150.0));
        assert!(config.show_area_warning);
        assert_eq!(
            config.order_number_placeholder.as_deref(),
            Some("JLCJLCJLCJLC")
        );
        assert_eq!(config.profile_extensions, vec![".gko", ".gm1"]);
        assert_eq!(config.filenames.top_copper, "overlay.GTL");
        assert_eq!(config.filenames.bottom_copper, "frame.GBL");
    }

    #[test]
    fn non_numeric_value_is_malformed() {
        let text = SAMPLE.replace("route_diameter: 2.0", "route_diameter: wide");
        let err = PanelConfig::from_yaml_str(&text, Path::new("test.yaml")).unwrap_err();
        assert!(matches!(
            err,
            PaneliserError::MalformedNumericConfig { ref key, .. } if key == "route_diameter"
        ));
    }

    #[test]
    fn excessive_precision_is_malformed() {
        let text = SAMPLE.replace("decimal_precision: 4", "decimal_precision: 400");
        let err = PanelConfig::from_yaml_str(&text, Path::new("test.yaml")).unwrap_err();
        assert!(matches!(
            err,
            PaneliserError::MalformedNumericConfig { ref key, ref value, .. }
                if key == "decimal_precision" && value == "400"
        ));
    }

    #[test]
    fn non_positive_tool_sizes_are_malformed() {
        for (from, to, key) in [
            ("route_diameter: 2.0", "route_diameter: -2.0", "route_diameter"),
            ("frame_width: 5", "frame_width: 0", "frame_width"),
            ("mousebite_diameter: \"0.5\"", "mousebite_diameter: -0.5", "mousebite_diameter"),
        ] {
            let text = SAMPLE.replace(from, to);
            let err = PanelConfig::from_yaml_str(&text, Path::new("test.yaml")).unwrap_err();
            assert!(
                matches!(err, PaneliserError::MalformedNumericConfig { key: ref k, .. } if k == key),
                "{key} accepted {to}"
            );
        }
    }

    #[test]
    fn missing_required_value_is_reported() {
        let text = SAMPLE.replace("  frame_width: 5\n", "");
        let err = PanelConfig::from_yaml_str(&text, Path::new("test.yaml")).unwrap_err();
        assert!(matches!(
            err,
            PaneliserError::MissingConfigValue { ref key, .. } if key == "frame_width"
        ));
    }

    #[test]
    fn disabled_placeholder_is_none() {
        let text = SAMPLE.replace("add_order_number_placeholder: yes", "add_order_number_placeholder: false");
        let config = PanelConfig::from_yaml_str(&text, Path::new("test.yaml")).expect("parse");
        assert_eq!(config.order_number_placeholder, None);
    }

    #[test]
    fn fill_offset_adds_clearance() {
        let config = PanelConfig::default();
        assert!((config.fill_offset() - 2.01).abs() < 1e-12);
    }
}
