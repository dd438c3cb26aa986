// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Locating bright aggressor spots on amplifier images.
//!
//! A candidate centre is the brightest pixel of a Gaussian-smoothed copy of the
//! image; smoothing removes hot pixels and cosmic rays. The candidate is only
//! accepted if the *unsmoothed* pixels within a circle around it are, on
//! average, brighter than a threshold, i.e. there really is an extended bright
//! region there.

#[cfg(test)]
mod tests;

use log::trace;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_SMOOTHING_SIGMA, DEFAULT_SPOT_RADIUS, DEFAULT_SPOT_THRESHOLD},
    math::{gaussian_filter, mean_in_circle, nan_argmax},
};

/// The outcome of looking for an aggressor spot on an amplifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpotSearch {
    /// A spot was found centred on this pixel.
    Found { y: usize, x: usize },

    /// No extended bright region was found.
    NotFound,
}

impl SpotSearch {
    pub fn is_found(&self) -> bool {
        matches!(self, SpotSearch::Found { .. })
    }
}

/// Settings for [`SpotFinder::find`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotFinder {
    /// The standard deviation of the smoothing Gaussian [pixels].
    pub sigma: f64,

    /// The radius of the verification circle [pixels].
    pub radius: f64,

    /// The mean inside the verification circle must exceed this value.
    pub threshold: f64,
}

impl Default for SpotFinder {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_SMOOTHING_SIGMA,
            radius: DEFAULT_SPOT_RADIUS,
            threshold: DEFAULT_SPOT_THRESHOLD,
        }
    }
}

impl SpotFinder {
    /// Look for an aggressor spot on an amplifier image.
    pub fn find(&self, image: ArrayView2<f64>) -> SpotSearch {
        self.find_with_mean(image).0
    }

    /// As [`SpotFinder::find`], but also return the mean inside the
    /// verification circle around the candidate (NaN if there was no
    /// candidate).
    pub fn find_with_mean(&self, image: ArrayView2<f64>) -> (SpotSearch, f64) {
        let smoothed = gaussian_filter(image, self.sigma);
        let (y, x) = match nan_argmax(smoothed.view()) {
            Some(c) => c,
            None => return (SpotSearch::NotFound, f64::NAN),
        };

        let mean = mean_in_circle(image, y, x, self.radius);
        trace!("Spot candidate at ({y}, {x}) has mean {mean}");
        // A NaN mean fails this comparison.
        if mean > self.threshold {
            (SpotSearch::Found { y, x }, mean)
        } else {
            (SpotSearch::NotFound, mean)
        }
    }
}

/// Look for an aggressor spot with the default verification radius.
pub fn find_spot(image: ArrayView2<f64>, sigma: f64, threshold: f64) -> SpotSearch {
    SpotFinder {
        sigma,
        threshold,
        ..Default::default()
    }
    .find(image)
}
