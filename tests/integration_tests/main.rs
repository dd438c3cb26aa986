// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod find_spots;
mod measure;
mod no_stderr;
mod results_summary;

use std::{path::Path, process::Output, str::from_utf8};

use assert_cmd::{output::OutputError, Command};
use fitsio::{
    images::{ImageDescription, ImageType},
    FitsFile,
};
use ndarray::prelude::*;
use tempfile::TempDir;

fn eo_xtalk() -> Command {
    Command::cargo_bin("eo-xtalk").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

const SIDE: usize = 40;

/// How much of the spot on S00 amplifier 1 leaks into S00 amplifier 2.
const XTALK: f64 = 0.003;

fn spot(cy: usize, cx: usize) -> Array2<f64> {
    Array2::from_shape_fn((SIDE, SIDE), |(y, x)| {
        let dy = y as f64 - cy as f64;
        let dx = x as f64 - cx as f64;
        let r2 = dy * dy + dx * dx;
        if r2 > 36.0 {
            0.0
        } else {
            50000.0 * (-r2 / 8.0).exp()
        }
    })
}

/// A raft of sensors S00 and S01 with 2 amplifiers each. S00 amplifier 1 has a
/// spot at (12, 12), S01 amplifier 2 has one at (28, 28) and S00 amplifier 2
/// picks up `XTALK` of the first. Every position is the same exposure.
struct SyntheticRaft {
    dir: TempDir,
}

impl SyntheticRaft {
    fn new(num_positions: usize) -> SyntheticRaft {
        let a = spot(12, 12);
        let b = spot(28, 28);
        let noise = Array2::from_shape_fn((SIDE, SIDE), |(y, x)| ((y * 7 + x * 3) % 5) as f64);
        let images = [
            &a + &noise,
            &noise + &(&a * XTALK),
            noise.clone(),
            &b + &noise,
        ];

        let dir = TempDir::new().unwrap();
        for (i_sensor, sensor) in ["S00", "S01"].into_iter().enumerate() {
            let sensor_dir = dir.path().join(sensor);
            std::fs::create_dir(&sensor_dir).unwrap();
            for position in 0..num_positions {
                let file = sensor_dir.join(format!("{sensor}_flat_{position:03}.fits"));
                write_sensor_file(&file, &images[i_sensor * 2..i_sensor * 2 + 2]);
            }
        }
        SyntheticRaft { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn path_string(&self) -> String {
        self.dir.path().display().to_string()
    }
}

fn write_sensor_file(file: &Path, images: &[Array2<f64>]) {
    let mut fptr = FitsFile::create(file).open().unwrap();
    let desc = ImageDescription {
        data_type: ImageType::Double,
        dimensions: &[SIDE, SIDE],
    };
    for (i, image) in images.iter().enumerate() {
        let hdu = fptr
            .create_image(format!("SEGMENT1{i}"), &desc)
            .unwrap();
        hdu.write_key(&mut fptr, "DATASEC", format!("[1:{SIDE},1:{SIDE}]"))
            .unwrap();
        hdu.write_image(&mut fptr, image.as_slice().unwrap())
            .unwrap();
    }
}

/// Arguments for `measure` that suit [`SyntheticRaft`].
#[rustfmt::skip]
fn small_measure_args(raft: &SyntheticRaft, num_positions: usize) -> Vec<String> {
    [
        "measure",
        "--no-progress-bars",
        "-d", &raft.path_string(),
        "--sensors", "S00,S01",
        "--amps-per-sensor", "2",
        "-p", &num_positions.to_string(),
        "-a", "2",
        "-l", "12",
        "-s", "1",
        "--spot-radius", "2",
        "--threshold", "20000",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
