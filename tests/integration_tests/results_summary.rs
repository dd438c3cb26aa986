// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{eo_xtalk, get_cmd_output, small_measure_args, SyntheticRaft};

#[test]
fn test_summary_of_measured_raft() {
    let raft = SyntheticRaft::new(2);
    let cmd = eo_xtalk().args(small_measure_args(&raft, 2)).ok();
    assert!(cmd.is_ok(), "measure failed: {}", cmd.err().unwrap());

    let results = raft.path().join("xtalk_results.fits");
    #[rustfmt::skip]
    let cmd = eo_xtalk()
        .args([
            "results-summary",
            &results.display().to_string(),
            "--top", "1",
            "--sensors", "S00,S01",
            "--amps-per-sensor", "2",
        ])
        .ok();
    assert!(cmd.is_ok(), "results-summary failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    // The lookup table next to the results is found automatically.
    assert!(
        stdout.contains("Aggressor S00, amplifier 1 (position 001, y 12, x 12)"),
        "{stdout}"
    );
    assert!(
        stdout.contains("S00, amplifier 2: +3.0") || stdout.contains("S00, amplifier 2: +2.99"),
        "{stdout}"
    );
    assert!(stdout.contains("Aggressor S01, amplifier 2"), "{stdout}");
}

#[test]
fn test_summary_of_missing_file() {
    let raft = SyntheticRaft::new(1);
    let cmd = eo_xtalk()
        .args([
            "results-summary",
            &raft.path().join("nope.fits").display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("nope.fits"), "{stderr}");
}
