// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use eo_xtalk::{CrosstalkResultGrid, LookupTable};

use crate::{eo_xtalk, get_cmd_output, small_measure_args, SyntheticRaft, XTALK};

#[test]
fn test_measure_synthetic_raft() {
    let raft = SyntheticRaft::new(3);
    let out = TempDir::new().unwrap();
    let out_str = out.path().display().to_string();

    let mut args = small_measure_args(&raft, 3);
    args.extend(["-o".to_string(), out_str]);
    let cmd = eo_xtalk().args(&args).ok();
    assert!(cmd.is_ok(), "measure failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Aggressor found at S00, amplifier 1"), "{stdout}");
    assert!(stdout.contains("Aggressor found at S01, amplifier 2"), "{stdout}");

    let (grid, metadata) =
        CrosstalkResultGrid::read_fits(&out.path().join("xtalk_results.fits")).unwrap();
    assert_eq!(grid.num_amps(), 4);
    assert_eq!(metadata.unwrap().num_positions, 3);
    assert_eq!(grid.xtalk[(0, 0)], 1.0);
    assert_eq!(grid.xtalk[(3, 3)], 1.0);
    assert_abs_diff_eq!(grid.xtalk[(0, 1)], XTALK, epsilon = 1e-4);
    assert_abs_diff_eq!(grid.xtalk[(0, 2)], 0.0, epsilon = 1e-4);
    assert_abs_diff_eq!(grid.xtalk[(3, 0)], 0.0, epsilon = 1e-4);
    // Amplifiers without spots keep empty rows.
    assert!(grid.xtalk.row(1).iter().all(|&x| x == 0.0));
    assert!(grid.xtalk.row(2).iter().all(|&x| x == 0.0));

    let lookup = LookupTable::read_json(&out.path().join("xtalk_lookup_table.json")).unwrap();
    assert_eq!(lookup.len(), 2);
    let location = lookup.get(3).unwrap();
    assert_eq!(location.position, 2);
    assert_eq!(location.sensor, "S01");
    assert_eq!(location.amp, 2);

    let log = std::fs::read_to_string(out.path().join("xtalk_analysis.log")).unwrap();
    assert!(log.contains("Starting position 002"), "{log}");
    assert!(log.contains("Aggressor found at S01, amplifier 2"), "{log}");
    assert!(!log.contains('\u{1b}'), "log file has colour codes");
}

#[test]
fn test_output_dir_defaults_to_input_dir() {
    let raft = SyntheticRaft::new(1);
    let cmd = eo_xtalk().args(small_measure_args(&raft, 1)).ok();
    assert!(cmd.is_ok(), "measure failed: {}", cmd.err().unwrap());
    assert!(raft.path().join("xtalk_results.fits").exists());
    assert!(raft.path().join("xtalk_lookup_table.json").exists());
}

#[test]
fn test_missing_position_is_fatal() {
    let raft = SyntheticRaft::new(2);
    let out = TempDir::new().unwrap();
    let out_str = out.path().display().to_string();

    let mut args = small_measure_args(&raft, 3);
    args.extend(["-o".to_string(), out_str]);
    let cmd = eo_xtalk().args(&args).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(
        stderr.contains("No input file for sensor S00 at position 002"),
        "{stderr}"
    );
    // Nothing is written unless every position was measured.
    assert!(!out.path().join("xtalk_results.fits").exists());
    assert!(!out.path().join("xtalk_lookup_table.json").exists());
}

#[test]
fn test_too_few_aggressors_is_fatal() {
    let raft = SyntheticRaft::new(1);
    let out = TempDir::new().unwrap();
    let out_str = out.path().display().to_string();

    // Only two amplifiers have spots.
    let cmd = eo_xtalk()
        .args([
            "measure",
            "--no-progress-bars",
            "-d",
            &raft.path_string(),
            "--sensors",
            "S00,S01",
            "--amps-per-sensor",
            "2",
            "-p",
            "1",
            "-a",
            "3",
            "-l",
            "12",
            "-s",
            "1",
            "--spot-radius",
            "2",
            "--threshold",
            "20000",
            "-o",
            &out_str,
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(
        stderr.contains("Only found 2 of 3 aggressor spots at position 000"),
        "{stderr}"
    );
    assert!(!out.path().join("xtalk_results.fits").exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let raft = SyntheticRaft::new(1);
    let mut args = small_measure_args(&raft, 1);
    args.push("--dry-run".to_string());
    let cmd = eo_xtalk().args(&args).ok();
    assert!(cmd.is_ok(), "dry run failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Dry run -- exiting now."), "{stdout}");
    assert!(!raft.path().join("xtalk_results.fits").exists());
    assert!(!raft.path().join("xtalk_analysis.log").exists());
}

#[test]
fn test_saved_toml_reproduces_run() {
    let raft = SyntheticRaft::new(1);
    let out = TempDir::new().unwrap();
    let toml = out.path().join("args.toml");
    let toml_str = toml.display().to_string();

    let mut args = small_measure_args(&raft, 1);
    args.extend(["--dry-run".to_string(), "--save-toml".to_string(), toml_str.clone()]);
    let cmd = eo_xtalk().args(&args).ok();
    assert!(cmd.is_ok(), "saving toml failed: {}", cmd.err().unwrap());
    assert!(toml.exists());

    // Run again from the file alone, sending the results elsewhere.
    let results_dir = out.path().join("from_toml");
    let cmd = eo_xtalk()
        .args([
            "measure",
            "--no-progress-bars",
            &toml_str,
            "-o",
            &results_dir.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "measure from toml failed: {}", cmd.err().unwrap());
    let (grid, _) = CrosstalkResultGrid::read_fits(&results_dir.join("xtalk_results.fits")).unwrap();
    assert_abs_diff_eq!(grid.xtalk[(0, 1)], XTALK, epsilon = 1e-4);
}

#[test]
fn test_explicit_log_file() {
    let raft = SyntheticRaft::new(1);
    let out = TempDir::new().unwrap();
    let log = out.path().join("my.log");

    let mut args = small_measure_args(&raft, 1);
    args.extend(["--log-file".to_string(), log.display().to_string()]);
    let cmd = eo_xtalk().args(&args).ok();
    assert!(cmd.is_ok(), "measure failed: {}", cmd.err().unwrap());

    let contents = std::fs::read_to_string(&log).unwrap();
    // The whole run is there, including the version line.
    assert!(contents.contains("eo-xtalk measure"), "{contents}");
    assert!(contents.contains("eo-xtalk measure complete."), "{contents}");
    assert!(!raft.path().join("xtalk_analysis.log").exists());
}
