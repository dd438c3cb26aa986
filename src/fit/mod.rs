// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Robust fitting of a crosstalk model between an aggressor and a victim
//! postage stamp.
//!
//! The victim stamp is modelled as
//!
//! `victim = xtalk * aggressor + tilt_y * Y + tilt_x * X + bias`
//!
//! where `Y` and `X` are the row and column indices of each pixel. The model is
//! fitted by weighted linear least squares a fixed number of times; before each
//! solve, pixels whose residual against the previous model is more than
//! `rejection_sigma` standard deviations from the mean residual are excluded.
//! The mask is rebuilt from every pixel each iteration, so a pixel excluded
//! early may be used again later.

mod error;

pub use error::{FitError, SingularReason};

use nalgebra::{DMatrix, DVector};
use ndarray::{prelude::*, Zip};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_NUM_ITERATIONS, DEFAULT_REJECTION_SIGMA},
    math::masked_mean_std,
};

/// The number of model parameters.
const NUM_PARAMS: usize = 4;

/// The fitted crosstalk model of one (aggressor, victim) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrosstalkFit {
    /// The fraction of the aggressor signal appearing on the victim.
    pub xtalk: f64,
    pub bias: f64,
    pub tilt_y: f64,
    pub tilt_x: f64,
    /// The 1-sigma uncertainty on `xtalk`.
    pub xtalk_error: f64,
}

impl CrosstalkFit {
    fn from_solution(coefficients: [f64; NUM_PARAMS], xtalk_variance: f64) -> CrosstalkFit {
        let [xtalk, bias, tilt_y, tilt_x] = coefficients;
        CrosstalkFit {
            xtalk,
            bias,
            tilt_y,
            tilt_x,
            xtalk_error: xtalk_variance.abs().sqrt(),
        }
    }
}

/// The state after one iteration of [`CrosstalkFitter::fit_traced`].
#[derive(Debug, Clone)]
pub struct FitIteration {
    /// (xtalk, bias, tilt_y, tilt_x) solved for on this iteration.
    pub coefficients: [f64; NUM_PARAMS],

    /// The pixels excluded from this iteration's solve (`true` is excluded).
    pub mask: Array2<bool>,

    /// The residual standard deviation used to build `mask`.
    pub residual_std: f64,
}

impl FitIteration {
    pub fn num_masked(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

/// Settings for the iterative crosstalk fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrosstalkFitter {
    /// The number of mask-then-solve iterations. This is a fixed budget; there
    /// is no convergence test.
    pub num_iterations: usize,

    /// Residual outlier threshold [standard deviations].
    pub rejection_sigma: f64,
}

impl Default for CrosstalkFitter {
    fn default() -> Self {
        Self {
            num_iterations: DEFAULT_NUM_ITERATIONS,
            rejection_sigma: DEFAULT_REJECTION_SIGMA,
        }
    }
}

impl CrosstalkFitter {
    pub fn new(num_iterations: usize) -> CrosstalkFitter {
        Self {
            num_iterations,
            ..Default::default()
        }
    }

    /// Fit the crosstalk model of `victim` against `aggressor`. The stamps must
    /// have the same shape.
    pub fn fit(
        &self,
        aggressor: ArrayView2<f64>,
        victim: ArrayView2<f64>,
    ) -> Result<CrosstalkFit, FitError> {
        self.fit_inner(aggressor, victim, None)
    }

    /// As [`CrosstalkFitter::fit`], but also return the state after each
    /// iteration.
    pub fn fit_traced(
        &self,
        aggressor: ArrayView2<f64>,
        victim: ArrayView2<f64>,
    ) -> Result<(CrosstalkFit, Vec<FitIteration>), FitError> {
        let mut trace = Vec::with_capacity(self.num_iterations);
        let fit = self.fit_inner(aggressor, victim, Some(&mut trace))?;
        Ok((fit, trace))
    }

    fn fit_inner(
        &self,
        aggressor: ArrayView2<f64>,
        victim: ArrayView2<f64>,
        mut trace: Option<&mut Vec<FitIteration>>,
    ) -> Result<CrosstalkFit, FitError> {
        if aggressor.dim() != victim.dim() {
            return Err(FitError::ShapeMismatch {
                aggressor: aggressor.dim(),
                victim: victim.dim(),
            });
        }

        // Pixels that can never take part in a fit.
        let invalid = Zip::from(&aggressor)
            .and(&victim)
            .map_collect(|a, v| !a.is_finite() || !v.is_finite());

        let mut mask = invalid.clone();
        let mut coefficients = [0.0; NUM_PARAMS];
        let mut xtalk_variance = f64::NAN;

        for i_iter in 0..self.num_iterations {
            let singular = |reason| FitError::Singular {
                iteration: i_iter + 1,
                reason,
            };

            let residual = &victim - &model(&coefficients, aggressor);
            let (residual_mean, residual_std) = masked_mean_std(residual.view(), mask.view())
                .ok_or_else(|| singular(SingularReason::AllMasked))?;

            // Remask from scratch; only the invalid pixels carry over.
            let limit = self.rejection_sigma * residual_std;
            mask = Zip::from(&residual)
                .and(&invalid)
                .map_collect(|r, &bad| bad || (r - residual_mean).abs() > limit);

            let (_, victim_std) = masked_mean_std(victim, mask.view())
                .ok_or_else(|| singular(SingularReason::AllMasked))?;
            if !(victim_std.is_finite() && victim_std > 0.0) {
                return Err(singular(SingularReason::NoScatter));
            }

            let (a, b) = weighted_system(aggressor, victim, mask.view(), victim_std);
            if a.nrows() < NUM_PARAMS {
                return Err(singular(SingularReason::TooFewPixels));
            }

            let svd = a.clone().svd(true, true);
            let tolerance = f64::EPSILON * a.nrows() as f64 * svd.singular_values.max();
            if svd.rank(tolerance) < NUM_PARAMS {
                return Err(singular(SingularReason::RankDeficient));
            }
            let solution = svd
                .solve(&b, tolerance)
                .map_err(|_| singular(SingularReason::RankDeficient))?;
            let covariance = (a.transpose() * &a)
                .try_inverse()
                .ok_or_else(|| singular(SingularReason::NotInvertible))?;

            for (c, s) in coefficients.iter_mut().zip(solution.iter()) {
                *c = *s;
            }
            xtalk_variance = covariance[(0, 0)];
            if !(coefficients.iter().all(|c| c.is_finite()) && xtalk_variance.is_finite()) {
                return Err(singular(SingularReason::NonFinite));
            }

            if let Some(trace) = trace.as_mut() {
                trace.push(FitIteration {
                    coefficients,
                    mask: mask.clone(),
                    residual_std,
                });
            }
        }

        Ok(CrosstalkFit::from_solution(coefficients, xtalk_variance))
    }
}

/// Evaluate the crosstalk model on the pixel grid of `aggressor`.
pub(crate) fn model(coefficients: &[f64; NUM_PARAMS], aggressor: ArrayView2<f64>) -> Array2<f64> {
    let [xtalk, bias, tilt_y, tilt_x] = *coefficients;
    let mut model = aggressor.mapv(|a| xtalk * a + bias);
    model.indexed_iter_mut().for_each(|((y, x), m)| {
        *m += tilt_y * y as f64 + tilt_x * x as f64;
    });
    model
}

/// Build the design matrix (aggressor, 1, Y, X) and the target vector from the
/// unmasked pixels, both divided by `weight`.
fn weighted_system(
    aggressor: ArrayView2<f64>,
    victim: ArrayView2<f64>,
    mask: ArrayView2<bool>,
    weight: f64,
) -> (DMatrix<f64>, DVector<f64>) {
    let mut rows = Vec::with_capacity(NUM_PARAMS * mask.len());
    let mut target = Vec::with_capacity(mask.len());
    for ((y, x), &masked) in mask.indexed_iter() {
        if masked {
            continue;
        }
        rows.extend_from_slice(&[
            aggressor[(y, x)] / weight,
            1.0 / weight,
            y as f64 / weight,
            x as f64 / weight,
        ]);
        target.push(victim[(y, x)] / weight);
    }

    let num_rows = target.len();
    (
        DMatrix::from_row_iterator(num_rows, NUM_PARAMS, rows),
        DVector::from_vec(target),
    )
}
