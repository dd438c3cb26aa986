// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from reading the frames of a raft.

use std::path::PathBuf;

use thiserror::Error;

use super::{datasec::DataSectionError, fits::FitsError};
use crate::io::GlobError;

#[derive(Error, Debug)]
pub enum RaftReadError {
    #[error("No input file for sensor {sensor} at position {position:03} (looked for {glob})")]
    MissingInput {
        sensor: String,
        position: usize,
        glob: String,
    },

    #[error("No FITS files in {dir}; can't determine the amplifier data section")]
    NoReferenceFile { dir: PathBuf },

    #[error("{file} HDU {hdu}: {problem}")]
    ShapeMismatch {
        file: PathBuf,
        hdu: usize,
        problem: String,
    },

    #[error("Reading {file} took longer than {seconds} seconds")]
    ReadTimeout { file: PathBuf, seconds: u64 },

    #[error("The thread reading {file} died before finishing")]
    ReaderDied { file: PathBuf },

    #[error("Reference data section: {0}")]
    DataSection(#[from] DataSectionError),

    #[error(transparent)]
    Glob(#[from] GlobError),

    #[error(transparent)]
    Fits(#[from] FitsError),
}
