// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading and writing the result grid as a FITS file.
//!
//! The primary HDU holds the crosstalk matrix, and the other products are image
//! extensions named `BIAS`, `TILT_Y`, `TILT_X` and `XTALK_ERROR`. The settings
//! of the measurement are recorded in the primary header.

use std::path::Path;

use log::debug;
use ndarray::prelude::*;

use super::{CrosstalkResultGrid, ResultsReadError, ResultsWriteError};
use crate::io::{
    read::fits::{fits_get_image_2d, fits_get_optional_key, fits_open, fits_open_hdu},
    write::{fits_create_image, fits_create_with_primary_image, fits_write_image, fits_write_key},
};

const BIAS_EXTNAME: &str = "BIAS";
const TILT_Y_EXTNAME: &str = "TILT_Y";
const TILT_X_EXTNAME: &str = "TILT_X";
const XTALK_ERROR_EXTNAME: &str = "XTALK_ERROR";

/// The settings that produced a result grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsMetadata {
    /// Postage stamp side length [pixels] (`LENGTH`).
    pub stamp_length: usize,

    /// Spot finding smoothing scale [pixels] (`SIGMA`).
    pub smoothing_sigma: f64,

    /// Spot check radius [pixels] (`RADIUS`).
    pub spot_radius: f64,

    /// Spot check mean threshold (`THRESH`).
    pub spot_threshold: f64,

    /// `NPOS`
    pub num_positions: usize,

    /// `NAGG`
    pub num_aggressors: usize,

    /// `NITER`
    pub num_iterations: usize,
}

pub(super) fn write(
    file: &Path,
    grid: &CrosstalkResultGrid,
    metadata: &ResultsMetadata,
) -> Result<(), ResultsWriteError> {
    let num_amps = grid.num_amps();
    let shape = (num_amps, num_amps);
    debug!("Writing {num_amps}x{num_amps} crosstalk results to {}", file.display());

    let mut fptr = fits_create_with_primary_image(file, shape)?;
    let hdu = fits_open_hdu(&mut fptr, 0_usize)?;
    fits_write_key(
        &mut fptr,
        &hdu,
        "SOFTWARE",
        format!(
            "Created by {} v{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ),
    )?;
    fits_write_key(&mut fptr, &hdu, "LENGTH", metadata.stamp_length as i64)?;
    fits_write_key(&mut fptr, &hdu, "SIGMA", metadata.smoothing_sigma)?;
    fits_write_key(&mut fptr, &hdu, "RADIUS", metadata.spot_radius)?;
    fits_write_key(&mut fptr, &hdu, "THRESH", metadata.spot_threshold)?;
    fits_write_key(&mut fptr, &hdu, "NPOS", metadata.num_positions as i64)?;
    fits_write_key(&mut fptr, &hdu, "NAGG", metadata.num_aggressors as i64)?;
    fits_write_key(&mut fptr, &hdu, "NITER", metadata.num_iterations as i64)?;
    fits_write_key(&mut fptr, &hdu, "NAMPS", num_amps as i64)?;
    fits_write_image(&mut fptr, &hdu, &to_row_major(grid.xtalk.view()))?;

    for (extname, image) in [
        (BIAS_EXTNAME, &grid.bias),
        (TILT_Y_EXTNAME, &grid.tilt_y),
        (TILT_X_EXTNAME, &grid.tilt_x),
        (XTALK_ERROR_EXTNAME, &grid.xtalk_error),
    ] {
        let hdu = fits_create_image(&mut fptr, extname, shape)?;
        fits_write_image(&mut fptr, &hdu, &to_row_major(image.view()))?;
    }

    Ok(())
}

pub(super) fn read(
    file: &Path,
) -> Result<(CrosstalkResultGrid, Option<ResultsMetadata>), ResultsReadError> {
    let mut fptr = fits_open(file)?;
    let hdu = fits_open_hdu(&mut fptr, 0_usize)?;

    let xtalk = fits_get_image_2d(&mut fptr, &hdu)?;
    let num_amps = xtalk.nrows();
    if xtalk.ncols() != num_amps {
        return Err(ResultsReadError::NotSquare {
            file: file.to_path_buf(),
            name: "crosstalk",
            shape: xtalk.dim(),
        });
    }

    let metadata = {
        let stamp_length = fits_get_optional_key(&mut fptr, &hdu, "LENGTH")?;
        let smoothing_sigma = fits_get_optional_key(&mut fptr, &hdu, "SIGMA")?;
        let spot_radius = fits_get_optional_key(&mut fptr, &hdu, "RADIUS")?;
        let spot_threshold = fits_get_optional_key(&mut fptr, &hdu, "THRESH")?;
        let num_positions = fits_get_optional_key(&mut fptr, &hdu, "NPOS")?;
        let num_aggressors = fits_get_optional_key(&mut fptr, &hdu, "NAGG")?;
        let num_iterations = fits_get_optional_key(&mut fptr, &hdu, "NITER")?;
        match (
            stamp_length,
            smoothing_sigma,
            spot_radius,
            spot_threshold,
            num_positions,
            num_aggressors,
            num_iterations,
        ) {
            (
                Some(stamp_length),
                Some(smoothing_sigma),
                Some(spot_radius),
                Some(spot_threshold),
                Some(num_positions),
                Some(num_aggressors),
                Some(num_iterations),
            ) => Some(ResultsMetadata {
                stamp_length,
                smoothing_sigma,
                spot_radius,
                spot_threshold,
                num_positions,
                num_aggressors,
                num_iterations,
            }),
            _ => None,
        }
    };

    let mut read_companion = |name: &'static str| -> Result<Array2<f64>, ResultsReadError> {
        let hdu = fits_open_hdu(&mut fptr, name)?;
        let image = fits_get_image_2d(&mut fptr, &hdu)?;
        if image.dim() != (num_amps, num_amps) {
            return Err(ResultsReadError::BadShape {
                file: file.to_path_buf(),
                name,
                shape: image.dim(),
                expected: num_amps,
            });
        }
        Ok(image)
    };
    let bias = read_companion(BIAS_EXTNAME)?;
    let tilt_y = read_companion(TILT_Y_EXTNAME)?;
    let tilt_x = read_companion(TILT_X_EXTNAME)?;
    let xtalk_error = read_companion(XTALK_ERROR_EXTNAME)?;

    Ok((
        CrosstalkResultGrid {
            xtalk,
            bias,
            tilt_y,
            tilt_x,
            xtalk_error,
        },
        metadata,
    ))
}

fn to_row_major(image: ArrayView2<f64>) -> Vec<f64> {
    image.iter().copied().collect()
}
