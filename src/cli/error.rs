// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all eo-xtalk-related errors. This should be the *only* error
//! enum that is publicly visible.

use thiserror::Error;

use super::{common::RaftArgsError, measure::MeasureArgsError};
use crate::{
    fit::FitError,
    io::{
        read::{fits::FitsError, DataSectionError, RaftReadError},
        GlobError,
    },
    params::MeasureError,
    raft::RaftLayoutError,
    results::{ResultsReadError, ResultsWriteError},
};

/// The *only* publicly visible error from eo-xtalk. Most messages carry a hint
/// about what the user can do about them.
#[derive(Error, Debug)]
pub enum XtalkError {
    /// An error related to the input raft data.
    #[error("{0}\n\nThe input directory should have one subdirectory per sensor (e.g. S00), each containing one FITS file per projector position with a name ending in _NNN.fits (e.g. _000.fits)")]
    Input(String),

    /// An error related to finding aggressor spots.
    #[error("{0}\n\nTry `eo-xtalk find-spots` on the problem position, or adjust the smoothing, radius and threshold")]
    Spots(String),

    /// An error related to a crosstalk fit.
    #[error("{0}")]
    Fit(String),

    /// An error related to reading or writing results.
    #[error("{0}")]
    Results(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files are TOML or JSON; `--save-toml` writes an example")]
    ArgFile(String),

    /// A cfitsio error. Because these are usually quite spartan, some
    /// suggestions are provided here.
    #[error("cfitsio error: {0}\n\nIf you don't know what this means, try turning up verbosity (-v or -vv) and maybe disabling progress bars.")]
    Cfitsio(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

// Binary sub-command errors.

impl From<MeasureArgsError> for XtalkError {
    fn from(e: MeasureArgsError) -> Self {
        let s = e.to_string();
        match e {
            MeasureArgsError::ZeroAggressors => Self::Spots(s),
            MeasureArgsError::ZeroIterations | MeasureArgsError::StampTooSmall(_) => Self::Fit(s),
            MeasureArgsError::ZeroPositions | MeasureArgsError::ZeroThreads => Self::Generic(s),
        }
    }
}

impl From<RaftArgsError> for XtalkError {
    fn from(e: RaftArgsError) -> Self {
        let s = e.to_string();
        match e {
            RaftArgsError::NoInputDir | RaftArgsError::InputDirNotFound(_) => Self::Input(s),
            RaftArgsError::ZeroTimeout | RaftArgsError::BadSpotParameter { .. } => {
                Self::Generic(s)
            }
            RaftArgsError::Layout(e) => Self::from(e),
            RaftArgsError::Read(e) => Self::from(e),
        }
    }
}

impl From<MeasureError> for XtalkError {
    fn from(e: MeasureError) -> Self {
        let s = e.to_string();
        match e {
            MeasureError::TooFewAggressors { .. } => Self::Spots(s),
            MeasureError::LayoutMismatch { .. } => Self::Input(s),
            MeasureError::Read(e) => Self::from(e),
            MeasureError::Write(e) => Self::from(e),
            MeasureError::ThreadPool(_) | MeasureError::IO(_) => Self::Generic(s),
        }
    }
}

// Library code errors.

impl From<RaftReadError> for XtalkError {
    fn from(e: RaftReadError) -> Self {
        let s = e.to_string();
        match e {
            RaftReadError::MissingInput { .. }
            | RaftReadError::NoReferenceFile { .. }
            | RaftReadError::ShapeMismatch { .. }
            | RaftReadError::DataSection(_) => Self::Input(s),
            RaftReadError::ReadTimeout { .. } | RaftReadError::ReaderDied { .. } => {
                Self::Generic(s)
            }
            RaftReadError::Glob(e) => Self::from(e),
            RaftReadError::Fits(e) => Self::from(e),
        }
    }
}

impl From<DataSectionError> for XtalkError {
    fn from(e: DataSectionError) -> Self {
        Self::Input(e.to_string())
    }
}

impl From<RaftLayoutError> for XtalkError {
    fn from(e: RaftLayoutError) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<FitError> for XtalkError {
    fn from(e: FitError) -> Self {
        Self::Fit(e.to_string())
    }
}

impl From<ResultsReadError> for XtalkError {
    fn from(e: ResultsReadError) -> Self {
        let s = e.to_string();
        match e {
            ResultsReadError::NotSquare { .. }
            | ResultsReadError::BadShape { .. }
            | ResultsReadError::Json { .. } => Self::Results(s),
            ResultsReadError::Fits(e) => Self::from(e),
            ResultsReadError::IO(e) => Self::from(e),
        }
    }
}

impl From<ResultsWriteError> for XtalkError {
    fn from(e: ResultsWriteError) -> Self {
        let s = e.to_string();
        match e {
            ResultsWriteError::Json(_) => Self::Results(s),
            ResultsWriteError::Fits(e) => Self::from(e),
            ResultsWriteError::IO(e) => Self::from(e),
        }
    }
}

impl From<FitsError> for XtalkError {
    fn from(e: FitsError) -> Self {
        Self::Cfitsio(e.to_string())
    }
}

impl From<GlobError> for XtalkError {
    fn from(e: GlobError) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<std::io::Error> for XtalkError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
