// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use crate::{eo_xtalk, get_cmd_output, small_measure_args, SyntheticRaft};

#[test]
fn test_measure_no_stderr() {
    let raft = SyntheticRaft::new(1);
    let cmd = eo_xtalk().args(small_measure_args(&raft, 1)).ok();
    assert!(
        cmd.is_ok(),
        "measure failed on simple test data: {}",
        cmd.err().unwrap()
    );
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

#[test]
fn test_find_spots_no_stderr() {
    let raft = SyntheticRaft::new(1);

    #[rustfmt::skip]
    let cmd = eo_xtalk()
        .args([
            "find-spots",
            "--no-progress-bars",
            "-d", &raft.path_string(),
            "--sensors", "S00,S01",
            "--amps-per-sensor", "2",
            "-s", "1",
            "--spot-radius", "2",
            "--threshold", "20000",
        ])
        .ok();
    assert!(
        cmd.is_ok(),
        "find-spots failed on simple test data: {}",
        cmd.err().unwrap()
    );
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}
