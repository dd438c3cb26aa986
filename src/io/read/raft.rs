// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading every amplifier of a raft at one projector position.
//!
//! The input directory has one subdirectory per sensor, and each of those has
//! one multi-extension FITS file per projector position (matched by
//! `*_{position:03}.fits`). HDUs 1 to `amps_per_sensor` hold the amplifier
//! images. Every amplifier is trimmed to the same data section, taken from the
//! `DATASEC` of HDU 1 of a reference file.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crossbeam_channel::RecvTimeoutError;
use log::{debug, trace, warn};
use ndarray::prelude::*;

use super::{
    datasec::DataSection,
    error::RaftReadError,
    fits::{fits_get_image_2d, fits_get_optional_key, fits_get_required_key, fits_open, fits_open_hdu},
};
use crate::{
    constants::DATASEC_KEY,
    io::{get_all_matches_from_glob, get_first_match_from_glob, glob_in_dir, GlobError},
    misc::run_with_timeout,
    raft::RaftLayout,
};

/// All amplifier frames of a raft at one projector position.
#[derive(Debug, Clone)]
pub(crate) struct RaftStack {
    pub(crate) position: usize,

    /// Shape (num_amps, section height, section width). The first axis is the
    /// flat amplifier index of the [`RaftLayout`].
    pub(crate) frames: Array3<f64>,
}

impl RaftStack {
    pub(crate) fn frame(&self, amp_index: usize) -> ArrayView2<f64> {
        self.frames.index_axis(Axis(0), amp_index)
    }

    pub(crate) fn num_amps(&self) -> usize {
        self.frames.len_of(Axis(0))
    }
}

/// Reads [`RaftStack`]s out of an input directory.
#[derive(Debug, Clone)]
pub(crate) struct RaftReader {
    input_dir: PathBuf,
    layout: RaftLayout,
    datasec: DataSection,
    read_timeout: Duration,
}

impl RaftReader {
    /// Set up a reader. The data section shared by all amplifiers is read here,
    /// once, from the first FITS file (in sorted order) of the first sensor.
    pub(crate) fn new(
        input_dir: &Path,
        layout: RaftLayout,
        read_timeout: Duration,
    ) -> Result<RaftReader, RaftReadError> {
        let first_sensor_dir = input_dir.join(&layout.sensors()[0]);
        let reference = get_all_matches_from_glob(&glob_in_dir(&first_sensor_dir, "*.fits"))?
            .into_iter()
            .next()
            .ok_or(RaftReadError::NoReferenceFile {
                dir: first_sensor_dir,
            })?;

        let mut fptr = fits_open(&reference)?;
        let hdu = fits_open_hdu(&mut fptr, 1_usize)?;
        let datasec: String = fits_get_required_key(&mut fptr, &hdu, DATASEC_KEY)?;
        let datasec: DataSection = datasec.parse()?;
        debug!(
            "Using data section {datasec} (shape {:?}) from {}",
            datasec.shape(),
            reference.display()
        );

        Ok(RaftReader {
            input_dir: input_dir.to_path_buf(),
            layout,
            datasec,
            read_timeout,
        })
    }

    pub(crate) fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub(crate) fn layout(&self) -> &RaftLayout {
        &self.layout
    }

    /// (height, width) of every amplifier frame.
    pub(crate) fn frame_shape(&self) -> (usize, usize) {
        self.datasec.shape()
    }

    /// Find the file of `sensor` at `position`. If more than one file matches,
    /// the first in sorted order is used.
    pub(crate) fn sensor_file(&self, sensor: &str, position: usize) -> Result<PathBuf, RaftReadError> {
        let glob = glob_in_dir(&self.input_dir.join(sensor), &format!("*_{position:03}.fits"));
        match get_first_match_from_glob(&glob) {
            Ok((file, 1)) => Ok(file),
            Ok((file, num_matches)) => {
                warn!(
                    "{num_matches} files match {glob}; using {}",
                    file.display()
                );
                Ok(file)
            }
            Err(GlobError::NoMatches { .. }) => Err(RaftReadError::MissingInput {
                sensor: sensor.to_string(),
                position,
                glob,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Read every amplifier of every sensor at `position` into one stack.
    pub(crate) fn read_position(&self, position: usize) -> Result<RaftStack, RaftReadError> {
        let (height, width) = self.frame_shape();
        let amps_per_sensor = self.layout.amps_per_sensor();
        let mut frames = Array3::zeros((self.layout.num_amps(), height, width));

        for (i_sensor, (sensor, mut sensor_frames)) in self
            .layout
            .sensors()
            .iter()
            .zip(frames.axis_chunks_iter_mut(Axis(0), amps_per_sensor))
            .enumerate()
        {
            let file = self.sensor_file(sensor, position)?;
            trace!("Reading {}", file.display());

            let amps = {
                let file = file.clone();
                let datasec = self.datasec.clone();
                run_with_timeout(
                    move || read_sensor_file(&file, amps_per_sensor, &datasec),
                    self.read_timeout,
                )
            };
            let amps = match amps {
                Ok(amps) => amps?,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(RaftReadError::ReadTimeout {
                        file,
                        seconds: self.read_timeout.as_secs(),
                    })
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(RaftReadError::ReaderDied { file })
                }
            };

            for (mut dest, amp) in sensor_frames.outer_iter_mut().zip(amps.iter()) {
                dest.assign(amp);
            }
            debug!(
                "Sensor {sensor} ({}/{}) added",
                i_sensor + 1,
                self.layout.sensors().len()
            );
        }

        Ok(RaftStack { position, frames })
    }
}

/// Read the data sections of HDUs 1 to `num_amps` of one sensor file.
fn read_sensor_file(
    file: &Path,
    num_amps: usize,
    datasec: &DataSection,
) -> Result<Vec<Array2<f64>>, RaftReadError> {
    let mut fptr = fits_open(file)?;
    let mut amps = Vec::with_capacity(num_amps);
    for i_hdu in 1..=num_amps {
        let hdu = fits_open_hdu(&mut fptr, i_hdu)?;
        let shape_mismatch = |problem: String| RaftReadError::ShapeMismatch {
            file: file.to_path_buf(),
            hdu: i_hdu,
            problem,
        };

        // An amplifier may not declare its own section, but if it does, it had
        // better agree with the reference.
        let declared: Option<String> = fits_get_optional_key(&mut fptr, &hdu, DATASEC_KEY)?;
        if let Some(declared) = declared {
            let declared: DataSection = declared
                .parse()
                .map_err(|e| shape_mismatch(format!("{e}")))?;
            if &declared != datasec {
                return Err(shape_mismatch(format!(
                    "declares data section {declared}, but the raft uses {datasec}"
                )));
            }
        }

        let image = fits_get_image_2d(&mut fptr, &hdu)?;
        let section = datasec
            .slice(image.view())
            .map_err(|e| shape_mismatch(format!("{e}")))?;
        amps.push(section.to_owned());
    }
    Ok(amps)
}
