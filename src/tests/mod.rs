// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Synthetic raft data for tests.

use std::path::Path;

use fitsio::{
    images::{ImageDescription, ImageType},
    FitsFile,
};
use ndarray::prelude::*;
use tempfile::TempDir;

use crate::{constants::DATASEC_KEY, raft::RaftLayout};

/// Side length of the synthetic amplifier images.
pub(crate) const SIDE: usize = 40;

/// Where the two aggressor spots are.
pub(crate) const SPOT_A: (usize, usize) = (12, 12);
pub(crate) const SPOT_B: (usize, usize) = (28, 28);

/// How much of spot A leaks into amplifier index 1, and so on.
pub(crate) const XTALK_A_TO_1: f64 = 0.001;
pub(crate) const XTALK_B_TO_1: f64 = 0.002;
pub(crate) const XTALK_A_TO_2: f64 = -0.0005;

/// Two sensors of two amplifiers each.
pub(crate) fn layout() -> RaftLayout {
    RaftLayout::new(vec!["S00".to_string(), "S01".to_string()], 2).unwrap()
}

/// A bright, narrow spot that is exactly zero beyond 6 pixels.
fn spot((cy, cx): (usize, usize)) -> Array2<f64> {
    Array2::from_shape_fn((SIDE, SIDE), |(y, x)| {
        let dy = y as f64 - cy as f64;
        let dx = x as f64 - cx as f64;
        let r2 = dy * dy + dx * dx;
        if r2 > 36.0 {
            0.0
        } else {
            60000.0 * (-r2 / 8.0).exp()
        }
    })
}

/// Spot A is on amplifier index 0 and spot B on index 3. Indices 1 and 2 only
/// see crosstalk.
pub(crate) fn amp_images() -> [Array2<f64>; 4] {
    let a = spot(SPOT_A);
    let b = spot(SPOT_B);
    let noise = Array2::from_shape_fn((SIDE, SIDE), |(y, x)| {
        if (y + x) % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    });
    [
        &a + &noise,
        &noise + &(&a * XTALK_A_TO_1) + &(&b * XTALK_B_TO_1),
        &noise + &(&a * XTALK_A_TO_2),
        &b + &noise,
    ]
}

/// Write one sensor file. Each image gets a one-pixel overscan column on the
/// right, which `DATASEC` excludes.
pub(crate) fn write_sensor_file(path: &Path, images: &[Array2<f64>]) {
    let mut fptr = FitsFile::create(path).open().unwrap();
    let desc = ImageDescription {
        data_type: ImageType::Double,
        dimensions: &[SIDE, SIDE + 1],
    };
    for (i, image) in images.iter().enumerate() {
        let mut padded = Array2::from_elem((SIDE, SIDE + 1), 1e6);
        padded.slice_mut(s![.., ..SIDE]).assign(image);
        let hdu = fptr
            .create_image(format!("SEGMENT{}", i + 1), &desc)
            .unwrap();
        hdu.write_key(&mut fptr, DATASEC_KEY, format!("[1:{SIDE},1:{SIDE}]"))
            .unwrap();
        hdu.write_image(&mut fptr, padded.as_slice().unwrap())
            .unwrap();
    }
}

/// A raft directory with the same exposure at every position.
pub(crate) fn spot_raft(num_positions: usize) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let layout = layout();
    let images = amp_images();
    let per_sensor = layout.amps_per_sensor();
    for (i_sensor, sensor) in layout.sensors().iter().enumerate() {
        let dir = tmp.path().join(sensor);
        std::fs::create_dir(&dir).unwrap();
        let sensor_images = &images[i_sensor * per_sensor..(i_sensor + 1) * per_sensor];
        for position in 0..num_positions {
            write_sensor_file(
                &dir.join(format!("xtalk_{sensor}_{position:03}.fits")),
                sensor_images,
            );
        }
    }
    tmp
}
