// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The products of a crosstalk measurement: the result grid (crosstalk matrix
//! and its companions) and the aggressor lookup table.

mod error;
mod fits;
mod lookup;

pub use error::{ResultsReadError, ResultsWriteError};
pub use fits::ResultsMetadata;
pub use lookup::{AggressorLocation, LookupTable};

use std::path::Path;

use ndarray::prelude::*;

use crate::fit::{CrosstalkFit, FitError};

/// The fitted crosstalk model parameters of every (aggressor, victim) pair.
/// Rows are aggressor amplifier indices and columns are victims.
#[derive(Debug, Clone, PartialEq)]
pub struct CrosstalkResultGrid {
    pub xtalk: Array2<f64>,
    pub bias: Array2<f64>,
    pub tilt_y: Array2<f64>,
    pub tilt_x: Array2<f64>,
    pub xtalk_error: Array2<f64>,
}

impl CrosstalkResultGrid {
    /// A zero-filled grid for `num_amps` amplifiers.
    pub fn new(num_amps: usize) -> CrosstalkResultGrid {
        let zeros = Array2::zeros((num_amps, num_amps));
        CrosstalkResultGrid {
            xtalk: zeros.clone(),
            bias: zeros.clone(),
            tilt_y: zeros.clone(),
            tilt_x: zeros.clone(),
            xtalk_error: zeros,
        }
    }

    pub fn num_amps(&self) -> usize {
        self.xtalk.nrows()
    }

    /// Mark `aggressor` as processed. An amplifier's crosstalk onto itself is 1
    /// by definition; its other cells are left alone.
    pub fn set_self(&mut self, aggressor: usize) {
        self.xtalk[(aggressor, aggressor)] = 1.0;
    }

    /// Store the outcome of a fit. A failed fit fills all five cells of the
    /// pair with NaN.
    pub fn record(
        &mut self,
        aggressor: usize,
        victim: usize,
        fit: &Result<CrosstalkFit, FitError>,
    ) {
        let cell = (aggressor, victim);
        let fit = match fit {
            Ok(fit) => *fit,
            Err(_) => CrosstalkFit {
                xtalk: f64::NAN,
                bias: f64::NAN,
                tilt_y: f64::NAN,
                tilt_x: f64::NAN,
                xtalk_error: f64::NAN,
            },
        };
        self.xtalk[cell] = fit.xtalk;
        self.bias[cell] = fit.bias;
        self.tilt_y[cell] = fit.tilt_y;
        self.tilt_x[cell] = fit.tilt_x;
        self.xtalk_error[cell] = fit.xtalk_error;
    }

    /// The model parameters of one pair.
    pub fn get(&self, aggressor: usize, victim: usize) -> Option<CrosstalkFit> {
        let cell = (aggressor, victim);
        Some(CrosstalkFit {
            xtalk: *self.xtalk.get(cell)?,
            bias: self.bias[cell],
            tilt_y: self.tilt_y[cell],
            tilt_x: self.tilt_x[cell],
            xtalk_error: self.xtalk_error[cell],
        })
    }

    /// The aggressors that have been through a measurement, i.e. those with a
    /// self-crosstalk of 1.
    pub fn processed_aggressors(&self) -> Vec<usize> {
        self.xtalk
            .diag()
            .iter()
            .enumerate()
            .filter(|&(_, &x)| x == 1.0)
            .map(|(i, _)| i)
            .collect()
    }

    /// The number of victims of `aggressor` whose fit failed.
    pub fn num_failed(&self, aggressor: usize) -> usize {
        self.xtalk.row(aggressor).iter().filter(|x| x.is_nan()).count()
    }

    /// The `n` victims of `aggressor` with the largest absolute crosstalk, most
    /// affected first. The aggressor itself and failed fits are skipped.
    pub fn strongest_victims(&self, aggressor: usize, n: usize) -> Vec<(usize, f64)> {
        let mut victims: Vec<(usize, f64)> = self
            .xtalk
            .row(aggressor)
            .iter()
            .copied()
            .enumerate()
            .filter(|&(victim, x)| victim != aggressor && !x.is_nan())
            .collect();
        victims.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()).then(a.0.cmp(&b.0)));
        victims.truncate(n);
        victims
    }

    /// Write the grid to a FITS file; see [`ResultsMetadata`] for the layout.
    pub fn write_fits(
        &self,
        file: &Path,
        metadata: &ResultsMetadata,
    ) -> Result<(), ResultsWriteError> {
        fits::write(file, self, metadata)
    }

    /// Read a grid written by [`CrosstalkResultGrid::write_fits`]. The metadata
    /// is `None` if any of its keys are missing.
    pub fn read_fits(
        file: &Path,
    ) -> Result<(CrosstalkResultGrid, Option<ResultsMetadata>), ResultsReadError> {
        fits::read(file)
    }
}
