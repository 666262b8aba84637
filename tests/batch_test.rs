//! Batch driver behavior over a mixed folder.
//!
//! Run with: `cargo test --test batch_test`

mod helpers;

use std::path::PathBuf;

use exif_scramble::config::{Config, DisplayConfig};
use exif_scramble::exif::SECTION_GPS;
use exif_scramble::pipeline::{CollectOptions, collect_images, run_batch};
use exif_scramble::randomize::{FailureKind, RandomizeOptions, Randomizer};
use tempfile::TempDir;

#[test]
fn batch_reports_failures_and_continues() {
    let dir = TempDir::new().unwrap();
    let a = helpers::write_plain_jpeg(dir.path(), "a.jpg");
    let corrupt = dir.path().join("b.jpg");
    std::fs::write(&corrupt, b"\xFF\xD8 truncated").unwrap();
    let c = helpers::write_eiffel_jpeg(dir.path(), "c.jpeg");
    let missing = dir.path().join("missing.jpg");

    let mut inputs = collect_images(&[dir.path().to_path_buf()], CollectOptions::CLI);
    assert_eq!(inputs, vec![a.clone(), corrupt.clone(), c.clone()]);
    inputs.push(missing);

    let randomizer = Randomizer::new(RandomizeOptions::default());
    let mut outcomes = Vec::new();
    let summary = run_batch(&inputs, &randomizer, &DisplayConfig::default(), |_, r| {
        outcomes.push(r.outcome.as_ref().map_err(|e| e.kind()).cloned());
    });

    assert_eq!(summary.processed, 4);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.by_kind.get(&FailureKind::Decode), Some(&1));
    assert_eq!(summary.by_kind.get(&FailureKind::NotFound), Some(&1));
    assert_eq!(outcomes[0], Ok(dir.path().join("modified_a.jpg")));
    assert!(outcomes[1].is_err());
    assert_eq!(outcomes[2], Ok(dir.path().join("modified_c.jpeg")));
    assert_eq!(outcomes[3], Err(FailureKind::NotFound));
}

#[test]
fn after_report_shows_new_gps() {
    let dir = TempDir::new().unwrap();
    let input = helpers::write_eiffel_jpeg(dir.path(), "tower.jpg");

    let randomizer = Randomizer::new(RandomizeOptions::default());
    let display = DisplayConfig {
        before: true,
        after: true,
    };
    let mut reports = Vec::new();
    run_batch(&[input], &randomizer, &display, |_, r| {
        reports.push((r.before.clone().unwrap(), r.after.clone().unwrap()));
    });

    let (before, after) = &reports[0];
    let lat_before: f64 = before.value(SECTION_GPS, "Latitude").unwrap().parse().unwrap();
    assert!((lat_before - helpers::EIFFEL_LAT).abs() < 0.001);
    assert!(after.value(SECTION_GPS, "Latitude").unwrap().parse::<f64>().is_ok());
    assert!(after.value(SECTION_GPS, "Altitude").unwrap().ends_with(" m"));
}

#[test]
fn minimal_config_skips_gps_section() {
    let dir = TempDir::new().unwrap();
    let input = helpers::write_plain_jpeg(dir.path(), "plain.jpg");

    let mut config = Config::default();
    config.randomize.full = false;
    let randomizer = Randomizer::new(RandomizeOptions::from(&config));

    let mut after = None;
    let summary = run_batch(&[input], &randomizer, &config.display, |_, r| {
        after = r.after.clone();
    });
    assert_eq!(summary.succeeded, 1);
    assert_eq!(after.unwrap().value(SECTION_GPS, "Status"), Some("No GPS data"));
}

#[test]
fn gui_collection_finds_nested_uppercase_files() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("2024").join("trip");
    std::fs::create_dir_all(&nested).unwrap();
    helpers::write_plain_jpeg(&nested, "IMG_0001.JPG");
    helpers::write_plain_jpeg(dir.path(), "cover.jpg");

    let cli: Vec<PathBuf> = collect_images(&[dir.path().to_path_buf()], CollectOptions::CLI);
    assert_eq!(cli.len(), 1);

    let gui = collect_images(&[dir.path().to_path_buf()], CollectOptions::GUI);
    assert_eq!(gui.len(), 2);
}
