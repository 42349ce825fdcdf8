//! Gerberset manifest reader and writer.
//!
//! A `.gerberset` is the XML placement file consumed by the external panel
//! merging tool: which gerber sets to load, where each copy is centred, and
//! where the break tabs (mousebites) go. Element names, their order and
//! back-slash paths must match what that tool expects.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use roxmltree::Node;

use crate::config::PanelConfig;
use crate::error::PaneliserError;
use crate::layout::{round_to, PanelLayout, PanelPoint};

const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// A placed copy of a loaded gerber set.
#[derive(Clone, Debug, PartialEq)]
pub struct GerberInstance {
    pub center: PanelPoint,
    pub angle: f64,
    pub gerber_path: String,
    pub generated: bool,
}

/// A break tab between two boards.
#[derive(Clone, Debug, PartialEq)]
pub struct BreakTab {
    pub center: PanelPoint,
    pub angle: f64,
    pub radius: f64,
    pub valid: bool,
}

/// The full placement manifest.
#[derive(Clone, Debug, PartialEq)]
pub struct GerberSetDocument {
    pub loaded_outlines: Vec<String>,
    pub instances: Vec<GerberInstance>,
    pub tabs: Vec<BreakTab>,
    pub width: f64,
    pub height: f64,
    pub margin_between_boards: f64,
    pub construct_negative_polygon: bool,
    pub fill_offset: f64,
    pub smoothing: u32,
    pub extra_tab_drill_distance: f64,
    pub clip_to_outlines: bool,
    pub last_export_folder: String,
    pub do_not_generate_mousebites: bool,
}

impl GerberSetDocument {
    /// Builds the manifest for `layout`.
    ///
    /// One instance is placed per board, plus one for the frame overlay at
    /// the panel origin when `frame_path` is given. Paths are converted to
    /// back-slash form.
    pub fn from_layout(
        layout: &PanelLayout,
        config: &PanelConfig,
        board_path: &Path,
        frame_path: Option<&Path>,
        export_folder: &Path,
    ) -> Self {
        let precision = config.decimal_precision;
        let board = windows_path(board_path);

        let mut loaded_outlines = vec![board.clone()];
        let mut instances: Vec<GerberInstance> = layout
            .boards
            .iter()
            .map(|center| GerberInstance {
                center: center.rounded(precision),
                angle: 0.0,
                gerber_path: board.clone(),
                generated: false,
            })
            .collect();

        if let Some(frame_path) = frame_path {
            let frame = windows_path(frame_path);
            loaded_outlines.push(frame.clone());
            instances.push(GerberInstance {
                center: PanelPoint::new(0.0, 0.0),
                angle: 0.0,
                gerber_path: frame,
                generated: false,
            });
        }

        let tabs = layout
            .mousebites
            .iter()
            .map(|center| BreakTab {
                center: center.rounded(precision),
                angle: 0.0,
                radius: round_to(config.mousebite_diameter, precision),
                valid: false,
            })
            .collect();

        Self {
            loaded_outlines,
            instances,
            tabs,
            width: round_to(layout.width, precision),
            height: round_to(layout.height, precision),
            margin_between_boards: round_to(config.route_diameter, precision),
            construct_negative_polygon: true,
            fill_offset: round_to(config.fill_offset(), precision),
            smoothing: 1,
            extra_tab_drill_distance: 0.0,
            clip_to_outlines: true,
            last_export_folder: windows_path(export_folder),
            do_not_generate_mousebites: false,
        }
    }

    /// Serializes the manifest as indented XML.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        writeln!(xml, "<?xml version=\"1.0\" encoding=\"utf-8\"?>").expect("write to string");
        writeln!(
            xml,
            "<GerberLayoutSet xmlns:xsd=\"{}\" xmlns:xsi=\"{}\">",
            XSD_NAMESPACE, XSI_NAMESPACE
        )
        .expect("write to string");

        writeln!(xml, "  <LoadedOutlines>").expect("write to string");
        for outline in &self.loaded_outlines {
            writeln!(xml, "    <string>{}</string>", xml_escape(outline)).expect("write to string");
        }
        writeln!(xml, "  </LoadedOutlines>").expect("write to string");

        writeln!(xml, "  <Instances>").expect("write to string");
        for instance in &self.instances {
            writeln!(xml, "    <GerberInstance>").expect("write to string");
            write_center(&mut xml, instance.center);
            writeln!(xml, "      <Angle>{}</Angle>", instance.angle).expect("write to string");
            writeln!(
                xml,
                "      <GerberPath>{}</GerberPath>",
                xml_escape(&instance.gerber_path)
            )
            .expect("write to string");
            writeln!(xml, "      <Generated>{}</Generated>", instance.generated)
                .expect("write to string");
            writeln!(xml, "    </GerberInstance>").expect("write to string");
        }
        writeln!(xml, "  </Instances>").expect("write to string");

        writeln!(xml, "  <Tabs>").expect("write to string");
        for tab in &self.tabs {
            writeln!(xml, "    <BreakTab>").expect("write to string");
            write_center(&mut xml, tab.center);
            writeln!(xml, "      <Angle>{}</Angle>", tab.angle).expect("write to string");
            writeln!(xml, "      <Radius>{}</Radius>", tab.radius).expect("write to string");
            writeln!(xml, "      <Valid>{}</Valid>", tab.valid).expect("write to string");
            writeln!(xml, "    </BreakTab>").expect("write to string");
        }
        writeln!(xml, "  </Tabs>").expect("write to string");

        writeln!(xml, "  <Width>{}</Width>", self.width).expect("write to string");
        writeln!(xml, "  <Height>{}</Height>", self.height).expect("write to string");
        writeln!(
            xml,
            "  <MarginBetweenBoards>{}</MarginBetweenBoards>",
            self.margin_between_boards
        )
        .expect("write to string");
        writeln!(
            xml,
            "  <ConstructNegativePolygon>{}</ConstructNegativePolygon>",
            self.construct_negative_polygon
        )
        .expect("write to string");
        writeln!(xml, "  <FillOffset>{}</FillOffset>", self.fill_offset).expect("write to string");
        writeln!(xml, "  <Smoothing>{}</Smoothing>", self.smoothing).expect("write to string");
        writeln!(
            xml,
            "  <ExtraTabDrillDistance>{}</ExtraTabDrillDistance>",
            self.extra_tab_drill_distance
        )
        .expect("write to string");
        writeln!(
            xml,
            "  <ClipToOutlines>{}</ClipToOutlines>",
            self.clip_to_outlines
        )
        .expect("write to string");
        writeln!(
            xml,
            "  <LastExportFolder>{}</LastExportFolder>",
            xml_escape(&self.last_export_folder)
        )
        .expect("write to string");
        writeln!(
            xml,
            "  <DoNotGenerateMouseBites>{}</DoNotGenerateMouseBites>",
            self.do_not_generate_mousebites
        )
        .expect("write to string");
        writeln!(xml, "</GerberLayoutSet>").expect("write to string");
        xml
    }

    /// Writes the manifest to `path`.
    pub fn write(&self, path: &Path) -> Result<(), PaneliserError> {
        fs::write(path, self.to_xml()).map_err(PaneliserError::Io)
    }
}

fn write_center(xml: &mut String, center: PanelPoint) {
    writeln!(xml, "      <Center>").expect("write to string");
    writeln!(xml, "        <X>{}</X>", center.x).expect("write to string");
    writeln!(xml, "        <Y>{}</Y>", center.y).expect("write to string");
    writeln!(xml, "      </Center>").expect("write to string");
}

/// Reads a `.gerberset` file.
pub fn read_gerberset(path: &Path) -> Result<GerberSetDocument, PaneliserError> {
    let xml = fs::read_to_string(path).map_err(PaneliserError::Io)?;
    parse_gerberset_str(&xml, path)
}

/// Parses gerberset XML. `path` is only used in error messages.
pub fn parse_gerberset_str(xml: &str, path: &Path) -> Result<GerberSetDocument, PaneliserError> {
    let document =
        roxmltree::Document::parse(xml).map_err(|source| PaneliserError::GerbersetParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    let root = document.root_element();
    if root.tag_name().name() != "GerberLayoutSet" {
        return Err(PaneliserError::GerbersetParse {
            path: path.to_path_buf(),
            message: "missing <GerberLayoutSet> root element".to_string(),
        });
    }

    let loaded_outlines = match child_element(root, "LoadedOutlines") {
        Some(outlines) => elements_named(outlines, "string")
            .filter_map(|node| node.text())
            .map(|text| text.trim().to_string())
            .collect(),
        None => Vec::new(),
    };

    let mut instances = Vec::new();
    if let Some(list) = child_element(root, "Instances") {
        for node in elements_named(list, "GerberInstance") {
            instances.push(GerberInstance {
                center: parse_center(node, path, "<GerberInstance>")?,
                angle: parse_optional_f64(node, "Angle", path, "<GerberInstance>")?.unwrap_or(0.0),
                gerber_path: required_child_text(node, "GerberPath", path, "<GerberInstance>")?,
                generated: parse_optional_bool(node, "Generated", path, "<GerberInstance>")?
                    .unwrap_or(false),
            });
        }
    }

    let mut tabs = Vec::new();
    if let Some(list) = child_element(root, "Tabs") {
        for node in elements_named(list, "BreakTab") {
            tabs.push(BreakTab {
                center: parse_center(node, path, "<BreakTab>")?,
                angle: parse_optional_f64(node, "Angle", path, "<BreakTab>")?.unwrap_or(0.0),
                radius: parse_required_f64(node, "Radius", path, "<BreakTab>")?,
                valid: parse_optional_bool(node, "Valid", path, "<BreakTab>")?.unwrap_or(false),
            });
        }
    }

    let context = "<GerberLayoutSet>";
    let smoothing_raw = required_child_text(root, "Smoothing", path, context)?;
    let smoothing = smoothing_raw
        .parse::<u32>()
        .map_err(|_| PaneliserError::GerbersetParse {
            path: path.to_path_buf(),
            message: format!("invalid <Smoothing> value '{smoothing_raw}'; expected u32"),
        })?;

    Ok(GerberSetDocument {
        loaded_outlines,
        instances,
        tabs,
        width: parse_required_f64(root, "Width", path, context)?,
        height: parse_required_f64(root, "Height", path, context)?,
        margin_between_boards: parse_required_f64(root, "MarginBetweenBoards", path, context)?,
        construct_negative_polygon: parse_optional_bool(
            root,
            "ConstructNegativePolygon",
            path,
            context,
        )?
        .unwrap_or(false),
        fill_offset: parse_required_f64(root, "FillOffset", path, context)?,
        smoothing,
        extra_tab_drill_distance: parse_optional_f64(root, "ExtraTabDrillDistance", path, context)?
            .unwrap_or(0.0),
        clip_to_outlines: parse_optional_bool(root, "ClipToOutlines", path, context)?
            .unwrap_or(false),
        last_export_folder: optional_child_text(root, "LastExportFolder").unwrap_or_default(),
        do_not_generate_mousebites: parse_optional_bool(
            root,
            "DoNotGenerateMouseBites",
            path,
            context,
        )?
        .unwrap_or(false),
    })
}

/// Converts a path to the back-slash form the panel merging tool expects.
pub fn windows_path(path: &Path) -> String {
    path.to_string_lossy().replace('/', "\\")
}

fn parse_center(node: Node<'_, '_>, path: &Path, context: &str) -> Result<PanelPoint, PaneliserError> {
    let center = required_child_element(node, "Center", path, context)?;
    Ok(PanelPoint::new(
        parse_required_f64(center, "X", path, "<Center>")?,
        parse_required_f64(center, "Y", path, "<Center>")?,
    ))
}

fn elements_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == tag)
}

fn required_child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Node<'a, 'input>, PaneliserError> {
    child_element(node, tag).ok_or_else(|| PaneliserError::GerbersetParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn required_child_text(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<String, PaneliserError> {
    optional_child_text(node, tag).ok_or_else(|| PaneliserError::GerbersetParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn parse_required_f64(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<f64, PaneliserError> {
    let raw = required_child_text(node, tag, path, context)?;
    parse_f64(&raw, tag, path, context)
}

fn parse_optional_f64(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Option<f64>, PaneliserError> {
    optional_child_text(node, tag)
        .map(|raw| parse_f64(&raw, tag, path, context))
        .transpose()
}

fn parse_f64(raw: &str, tag: &str, path: &Path, context: &str) -> Result<f64, PaneliserError> {
    raw.parse::<f64>().map_err(|_| PaneliserError::GerbersetParse {
        path: path.to_path_buf(),
        message: format!(
            "invalid <{tag}> value '{raw}' in {context}; expected floating-point number"
        ),
    })
}

fn parse_optional_bool(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Option<bool>, PaneliserError> {
    optional_child_text(node, tag)
        .map(|raw| match raw.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(PaneliserError::GerbersetParse {
                path: path.to_path_buf(),
                message: format!("invalid <{tag}> value '{raw}' in {context}; expected true/false"),
            }),
        })
        .transpose()
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

fn optional_child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{build_layout, BoardBounds, LayoutRequest};
    use crate::validation::ValidationReport;

    fn document() -> GerberSetDocument {
        let request = LayoutRequest::new(BoardBounds::new(20.0, 15.0, 0.0, 0.0), 2, 2)
            .with_mousebites(["bc", "tc"]);
        let layout = build_layout(&request, &mut ValidationReport::new()).expect("layout");
        GerberSetDocument::from_layout(
            &layout,
            &PanelConfig::default(),
            Path::new("boards/demo.zip"),
            Some(Path::new("boards/panel_frame_overlay.zip")),
            Path::new("boards/panel_export"),
        )
    }

    #[test]
    fn paths_use_back_slashes() {
        assert_eq!(windows_path(Path::new("a/b/c.zip")), "a\\b\\c.zip");
        let doc = document();
        assert_eq!(doc.loaded_outlines, vec!["boards\\demo.zip", "boards\\panel_frame_overlay.zip"]);
        assert_eq!(doc.last_export_folder, "boards\\panel_export");
    }

    #[test]
    fn frame_instance_sits_at_origin_after_boards() {
        let doc = document();
        assert_eq!(doc.instances.len(), 5);
        let frame = doc.instances.last().expect("frame instance");
        assert_eq!(frame.center, PanelPoint::new(0.0, 0.0));
        assert!(frame.gerber_path.ends_with("panel_frame_overlay.zip"));
        assert_eq!(doc.instances[0].center, PanelPoint::new(7.0, 7.0));
    }

    #[test]
    fn xml_has_fixed_element_order() {
        let xml = document().to_xml();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<GerberLayoutSet xmlns:xsd="));
        let order = [
            "<LoadedOutlines>",
            "<Instances>",
            "<Tabs>",
            "<Width>56</Width>",
            "<Height>46</Height>",
            "<MarginBetweenBoards>2</MarginBetweenBoards>",
            "<ConstructNegativePolygon>true</ConstructNegativePolygon>",
            "<FillOffset>2.01</FillOffset>",
            "<Smoothing>1</Smoothing>",
            "<ExtraTabDrillDistance>0</ExtraTabDrillDistance>",
            "<ClipToOutlines>true</ClipToOutlines>",
            "<LastExportFolder>",
            "<DoNotGenerateMouseBites>false</DoNotGenerateMouseBites>",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|tag| xml.find(tag).unwrap_or_else(|| panic!("{tag} missing")))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(xml.contains("      <Radius>0.5</Radius>\n      <Valid>false</Valid>"));
    }

    #[test]
    fn parses_what_it_writes() {
        let doc = document();
        let parsed = parse_gerberset_str(&doc.to_xml(), Path::new("demo.gerberset")).expect("parse");
        assert_eq!(parsed, doc);
    }

    #[test]
    fn rejects_wrong_root() {
        let err = parse_gerberset_str("<Other/>", Path::new("x.gerberset")).unwrap_err();
        assert!(matches!(err, PaneliserError::GerbersetParse { .. }));
    }

    #[test]
    fn escapes_special_characters_in_paths() {
        let mut doc = document();
        doc.loaded_outlines = vec!["R&D\\board.zip".to_string()];
        let xml = doc.to_xml();
        assert!(xml.contains("<string>R&amp;D\\board.zip</string>"));
        let parsed = parse_gerberset_str(&xml, Path::new("x.gerberset")).expect("parse");
        assert_eq!(parsed.loaded_outlines, vec!["R&D\\board.zip"]);
    }
}
