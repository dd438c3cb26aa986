// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{eo_xtalk, get_cmd_output, SyntheticRaft};

#[test]
fn test_find_spots_reports_every_amplifier() {
    let raft = SyntheticRaft::new(2);

    #[rustfmt::skip]
    let cmd = eo_xtalk()
        .args([
            "find-spots",
            "-d", &raft.path_string(),
            "--position", "1",
            "--sensors", "S00", "S01",
            "--amps-per-sensor", "2",
            "-s", "1",
            "--spot-radius", "2",
            "--threshold", "20000",
        ])
        .ok();
    assert!(cmd.is_ok(), "find-spots failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("S00, amplifier 1: Found at (y 12, x 12)"), "{stdout}");
    assert!(stdout.contains("S00, amplifier 2: NotFound"), "{stdout}");
    assert!(stdout.contains("S01, amplifier 1: NotFound"), "{stdout}");
    assert!(stdout.contains("S01, amplifier 2: Found at (y 28, x 28)"), "{stdout}");
    assert!(stdout.contains("2 of 4 amplifiers have a spot at position 001"), "{stdout}");
}

#[test]
fn test_find_spots_missing_position() {
    let raft = SyntheticRaft::new(1);

    #[rustfmt::skip]
    let cmd = eo_xtalk()
        .args([
            "find-spots",
            "-d", &raft.path_string(),
            "--position", "4",
            "--sensors", "S00,S01",
            "--amps-per-sensor", "2",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("position 004"), "{stderr}");
}
