// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use approx::assert_abs_diff_eq;
use clap::Parser;
use tempfile::TempDir;

use super::MeasureArgs;
use crate::{
    constants::{DEFAULT_LOOKUP_FILENAME, DEFAULT_NUM_ITERATIONS, DEFAULT_RESULTS_FILENAME},
    results::{CrosstalkResultGrid, LookupTable},
    tests::{spot_raft, SPOT_A, XTALK_A_TO_1, XTALK_A_TO_2, XTALK_B_TO_1},
    XtalkError,
};

/// Arguments that find both spots of the synthetic raft, followed by `extra`.
fn small_raft_args(input_dir: &Path, output_dir: &Path, extra: &[&str]) -> Vec<String> {
    let input_dir = input_dir.display().to_string();
    let output_dir = output_dir.display().to_string();
    #[rustfmt::skip]
    let args = [
        "measure",
        "-d", &input_dir,
        "--sensors", "S00", "S01",
        "--amps-per-sensor", "2",
        "-p", "2",
        "-s", "1",
        "--spot-radius", "2",
        "--threshold", "20000",
        "-o", &output_dir,
    ];
    args.iter().chain(extra).map(|s| s.to_string()).collect()
}

fn measure_args(input_dir: &Path, output_dir: &Path) -> Vec<String> {
    small_raft_args(input_dir, output_dir, &["-l", "12", "-a", "2"])
}

#[test]
fn test_merge_toml_prefers_cli() {
    let tmp = TempDir::new().unwrap();
    let arg_file = tmp.path().join("args.toml");
    std::fs::write(
        &arg_file,
        r#"
length = 30
positions = 2

[raft]
input_dir = "/some/where"
sensors = ["S00", "S01"]

[spots]
smoothing = 1.5
threshold = 20000.0
"#,
    )
    .unwrap();

    let arg_file_str = arg_file.display().to_string();
    let args = MeasureArgs::parse_from(["measure", &arg_file_str, "--length", "12", "-s", "3"]);
    let merged = args.merge().unwrap();
    assert!(merged.args_file.is_none());
    assert_eq!(merged.length, Some(12));
    assert_eq!(merged.positions, Some(2));
    assert_eq!(merged.iterations, None);
    assert_eq!(merged.raft_args.input_dir, Some(PathBuf::from("/some/where")));
    assert_eq!(
        merged.raft_args.sensors,
        Some(vec!["S00".to_string(), "S01".to_string()])
    );
    assert_eq!(merged.spot_args.smoothing, Some(3.0));
    assert_eq!(merged.spot_args.threshold, Some(20000.0));
}

#[test]
fn test_merge_json() {
    let tmp = TempDir::new().unwrap();
    let arg_file = tmp.path().join("args.json");
    std::fs::write(
        &arg_file,
        r#"{"aggressors": 3, "raft": {"amps_per_sensor": 8}, "results_filename": "r.fits"}"#,
    )
    .unwrap();

    let arg_file_str = arg_file.display().to_string();
    let merged = MeasureArgs::parse_from(["measure", &arg_file_str])
        .merge()
        .unwrap();
    assert_eq!(merged.aggressors, Some(3));
    assert_eq!(merged.raft_args.amps_per_sensor, Some(8));
    assert_eq!(merged.results_filename, Some(PathBuf::from("r.fits")));
}

#[test]
fn test_bad_arg_files() {
    let tmp = TempDir::new().unwrap();

    let arg_file = tmp.path().join("args.yaml");
    std::fs::write(&arg_file, "length: 3").unwrap();
    let args = MeasureArgs {
        args_file: Some(arg_file),
        ..Default::default()
    };
    assert!(matches!(args.merge(), Err(XtalkError::ArgFile(_))));

    let arg_file = tmp.path().join("args.toml");
    std::fs::write(&arg_file, "length = \"long\"").unwrap();
    let args = MeasureArgs {
        args_file: Some(arg_file),
        ..Default::default()
    };
    assert!(matches!(args.merge(), Err(XtalkError::ArgFile(_))));
}

#[test]
fn test_saved_toml_can_be_read_back() {
    let tmp = TempDir::new().unwrap();
    let args = MeasureArgs::parse_from(measure_args(tmp.path(), tmp.path()));
    let toml_str = toml::to_string(&args).unwrap();
    let arg_file = tmp.path().join("saved.toml");
    std::fs::write(&arg_file, toml_str).unwrap();

    let merged = MeasureArgs {
        args_file: Some(arg_file),
        ..Default::default()
    }
    .merge()
    .unwrap();
    assert_eq!(merged.length, Some(12));
    assert_eq!(merged.spot_args.spot_radius, Some(2.0));
    assert_eq!(merged.raft_args.input_dir, Some(tmp.path().to_path_buf()));
}

#[test]
fn test_parse_rejects_bad_values() {
    let raft = spot_raft(1);
    let out = TempDir::new().unwrap();

    let args = small_raft_args(raft.path(), out.path(), &["-i", "0"]);
    let result = MeasureArgs::parse_from(args).parse();
    assert!(matches!(result, Err(XtalkError::Fit(_))));

    let args = small_raft_args(raft.path(), out.path(), &["-l", "1"]);
    let result = MeasureArgs::parse_from(args).parse();
    assert!(matches!(result, Err(XtalkError::Fit(_))));

    let args = small_raft_args(raft.path(), out.path(), &["-a", "0"]);
    let result = MeasureArgs::parse_from(args).parse();
    assert!(matches!(result, Err(XtalkError::Spots(_))));

    let args = small_raft_args(raft.path(), out.path(), &["--read-timeout", "0"]);
    let result = MeasureArgs::parse_from(args).parse();
    assert!(matches!(result, Err(XtalkError::Generic(_))));

    let result = MeasureArgs::parse_from(["measure"]).parse();
    assert!(matches!(result, Err(XtalkError::Input(_))));
}

#[test]
fn test_parse_defaults() {
    let raft = spot_raft(1);
    let raft_str = raft.path().display().to_string();
    let params = MeasureArgs::parse_from([
        "measure",
        "-d",
        &raft_str,
        "--sensors",
        "S00,S01",
        "--amps-per-sensor",
        "2",
    ])
    .parse()
    .unwrap();

    // The output directory defaults to the input directory.
    assert_eq!(params.results_file, raft.path().join(DEFAULT_RESULTS_FILENAME));
    assert_eq!(params.lookup_file, raft.path().join(DEFAULT_LOOKUP_FILENAME));
    assert_eq!(params.settings.fitter.num_iterations, DEFAULT_NUM_ITERATIONS);
    assert_eq!(params.settings.layout.num_amps(), 4);
    assert!(params.num_threads.is_none());
}

#[test]
fn test_dry_run_writes_nothing() {
    let raft = spot_raft(2);
    let out = TempDir::new().unwrap();
    let output_dir = out.path().join("results");
    let args = MeasureArgs::parse_from(measure_args(raft.path(), &output_dir));
    args.run(true).unwrap();
    assert!(!output_dir.exists());
}

#[test]
fn test_measure_synthetic_raft() {
    let raft = spot_raft(2);
    let out = TempDir::new().unwrap();
    let output_dir = out.path().join("results");
    let args = MeasureArgs::parse_from(measure_args(raft.path(), &output_dir));
    args.run(false).unwrap();

    let (grid, metadata) =
        CrosstalkResultGrid::read_fits(&output_dir.join(DEFAULT_RESULTS_FILENAME)).unwrap();
    let metadata = metadata.unwrap();
    assert_eq!(metadata.num_positions, 2);
    assert_eq!(metadata.stamp_length, 12);
    assert_eq!(grid.num_amps(), 4);

    assert_eq!(grid.xtalk[(0, 0)], 1.0);
    assert_eq!(grid.xtalk[(3, 3)], 1.0);
    assert_abs_diff_eq!(grid.xtalk[(0, 1)], XTALK_A_TO_1, epsilon = 1e-5);
    assert_abs_diff_eq!(grid.xtalk[(0, 2)], XTALK_A_TO_2, epsilon = 1e-5);
    assert_abs_diff_eq!(grid.xtalk[(3, 1)], XTALK_B_TO_1, epsilon = 1e-5);
    assert!(grid.xtalk.row(1).iter().all(|&x| x == 0.0));

    let lookup = LookupTable::read_json(&output_dir.join(DEFAULT_LOOKUP_FILENAME)).unwrap();
    assert_eq!(lookup.len(), 2);
    let a = lookup.get(0).unwrap();
    // Every position is the same exposure, so the last one wins.
    assert_eq!(a.position, 1);
    assert_eq!((a.sensor.as_str(), a.amp), ("S00", 1));
    assert!(a.y.abs_diff(SPOT_A.0) <= 1 && a.x.abs_diff(SPOT_A.1) <= 1);
    assert_eq!(lookup.get(3).unwrap().sensor, "S01");
}
