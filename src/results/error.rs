// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with reading or writing crosstalk results.

use std::path::PathBuf;

use thiserror::Error;

use crate::io::read::fits::FitsError;

#[derive(Error, Debug)]
pub enum ResultsReadError {
    #[error("{file}: expected the {name} image to be square, but it has shape {shape:?}")]
    NotSquare {
        file: PathBuf,
        name: &'static str,
        shape: (usize, usize),
    },

    #[error("{file}: the {name} image has shape {shape:?}, but the crosstalk image has {expected} amplifiers")]
    BadShape {
        file: PathBuf,
        name: &'static str,
        shape: (usize, usize),
        expected: usize,
    },

    #[error("Couldn't parse lookup table {file}: {err}")]
    Json {
        file: PathBuf,
        err: serde_json::Error,
    },

    #[error(transparent)]
    Fits(#[from] FitsError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ResultsWriteError {
    #[error("Couldn't serialise the lookup table: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Fits(#[from] FitsError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
