#![allow(dead_code)]

use paneliser::layout::{Alignment, Location, MousebiteDescriptor};
use paneliser::BoardBounds;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Coordinates are compared after rounding to four decimal places.
pub const EPS_PRECISION: f64 = 1e-4;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Board sizes from 2mm to 200mm, origins within ±50mm, at 0.01mm steps.
pub fn arb_bounds() -> BoxedStrategy<BoardBounds> {
    (200u32..=20_000, 200u32..=20_000, -5_000i32..=5_000, -5_000i32..=5_000)
        .prop_map(|(sx, sy, ox, oy)| {
            BoardBounds::new(
                sx as f64 / 100.0,
                sy as f64 / 100.0,
                ox as f64 / 100.0,
                oy as f64 / 100.0,
            )
        })
        .boxed()
}

pub fn arb_descriptor() -> BoxedStrategy<MousebiteDescriptor> {
    let location = prop_oneof![
        Just(Location::Bottom),
        Just(Location::Top),
        Just(Location::Left),
        Just(Location::Right),
    ];
    let alignment = prop_oneof![
        Just(Alignment::Center),
        Just(Alignment::Left),
        Just(Alignment::Right),
        Just(Alignment::LeftThird),
        Just(Alignment::RightThird),
    ];
    (location, alignment)
        .prop_map(|(location, alignment)| MousebiteDescriptor::new(location, alignment))
        .boxed()
}

/// Up to four valid mousebite codes, e.g. `["bc", "tl"]`.
pub fn arb_codes() -> BoxedStrategy<Vec<String>> {
    proptest::collection::vec(arb_descriptor(), 0..=4)
        .prop_map(|descriptors| descriptors.iter().map(ToString::to_string).collect())
        .boxed()
}
