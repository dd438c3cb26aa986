// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with fitting crosstalk models.

use strum_macros::Display;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Aggressor stamp has shape {aggressor:?}, but victim stamp has shape {victim:?}")]
    ShapeMismatch {
        aggressor: (usize, usize),
        victim: (usize, usize),
    },

    #[error("Crosstalk fit was singular on iteration {iteration}: {reason}")]
    Singular {
        /// 1-based.
        iteration: usize,
        reason: SingularReason,
    },
}

/// Why a least-squares problem could not be solved.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum SingularReason {
    #[strum(serialize = "every pixel is masked")]
    AllMasked,

    #[strum(serialize = "fewer unmasked pixels than model parameters")]
    TooFewPixels,

    #[strum(serialize = "the unmasked victim pixels have no scatter")]
    NoScatter,

    #[strum(serialize = "the design matrix is rank deficient")]
    RankDeficient,

    #[strum(serialize = "the normal matrix could not be inverted")]
    NotInvertible,

    #[strum(serialize = "the solution is not finite")]
    NonFinite,
}
