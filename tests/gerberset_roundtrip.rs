mod common;

use std::path::Path;

use paneliser::gerberset::{parse_gerberset_str, read_gerberset, GerberSetDocument};
use paneliser::layout::PanelPoint;
use paneliser::pipeline::{run_panel_job, FrameStamp, PanelJob};
use paneliser::validation::ValidationReport;
use paneliser::{build_layout, BoardBounds, LayoutRequest, PanelConfig, SupportBarSchedule};

const EPS: f64 = 1e-4;

fn assert_points_match(left: &[PanelPoint], right: &[PanelPoint]) {
    assert_eq!(left.len(), right.len(), "point count mismatch");
    for wanted in left {
        assert!(
            right
                .iter()
                .any(|p| (p.x - wanted.x).abs() <= EPS && (p.y - wanted.y).abs() <= EPS),
            "missing point {}",
            wanted
        );
    }
}

#[test]
fn manifest_written_by_job_recovers_layout() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = common::board_zip(temp.path(), "sensor", 33.3333, 21.1);

    let mut job = PanelJob::new(&input, 3, 2).expect("job");
    job.title = "SENSOR".to_string();
    job.mousebite_codes = vec!["bl".into(), "br".into(), "rc".into(), "lc".into()];
    job.support_bars = SupportBarSchedule {
        every_n_x: Some(2),
        every_n_y: None,
    };
    job.stamp = FrameStamp {
        date: "18/Oct/2026".to_string(),
        created: "2026-10-18T12:00:00+00:00".to_string(),
    };
    let outcome = run_panel_job(&job).expect("run job");

    let path = outcome.written.gerberset.expect("gerberset written");
    let document = read_gerberset(&path).expect("read gerberset");

    let boards: Vec<PanelPoint> = document
        .instances
        .iter()
        .filter(|instance| instance.gerber_path.ends_with("sensor.zip"))
        .map(|instance| instance.center)
        .collect();
    assert_points_match(&outcome.layout.boards, &boards);

    let tabs: Vec<PanelPoint> = document.tabs.iter().map(|tab| tab.center).collect();
    assert_points_match(&outcome.layout.mousebites, &tabs);
    assert!(document.tabs.iter().all(|tab| !tab.valid && tab.radius == 0.5));

    assert_eq!(document.width, outcome.layout.width);
    assert_eq!(document.height, outcome.layout.height);
    assert!(document.last_export_folder.ends_with("panel_export"));
    assert!(!document.last_export_folder.contains('/'));
}

#[test]
fn coarse_precision_survives_round_trip() {
    let config = PanelConfig {
        decimal_precision: 2,
        ..PanelConfig::default()
    };
    let bounds = BoardBounds::from_extents((-1.234567, 18.765433), (0.0, 12.3456789));
    let request = LayoutRequest::from_config(&config, bounds, 4, 3).with_mousebites(["tx", "tv"]);
    let layout = build_layout(&request, &mut ValidationReport::new()).expect("layout");

    let document = GerberSetDocument::from_layout(
        &layout,
        &config,
        Path::new("C:/boards/sensor.zip"),
        None,
        Path::new("C:/boards/panel_export"),
    );
    let xml = document.to_xml();
    let parsed = parse_gerberset_str(&xml, Path::new("sensor.gerberset")).expect("parse");

    assert_eq!(parsed, document);
    assert_eq!(parsed.instances.len(), 12);
    assert_eq!(parsed.loaded_outlines, vec!["C:\\boards\\sensor.zip"]);
    for instance in &parsed.instances {
        assert_eq!(instance.center, instance.center.rounded(2));
    }
}
