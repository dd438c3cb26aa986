// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with reading and writing FITS files.

use std::{panic::Location, path::Path};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitsError {
    /// Error when opening or creating a FITS file.
    #[error("{source_file}:{source_line}:{source_column}: Couldn't open {fits_filename}: {fits_error}")]
    Open {
        fits_error: Box<fitsio::errors::Error>,
        fits_filename: Box<Path>,
        source_file: &'static str,
        source_line: u32,
        source_column: u32,
    },

    /// Error describing a key that couldn't be found in a FITS header.
    #[error("{source_file}:{source_line}:{source_column}: {fits_filename} HDU {hdu_num}: Couldn't find key {key}")]
    MissingKey {
        key: Box<str>,
        fits_filename: Box<Path>,
        hdu_num: usize,
        source_file: &'static str,
        source_line: u32,
        source_column: u32,
    },

    /// Error describing a HDU that couldn't be used as an image.
    #[error("{source_file}:{source_line}:{source_column}: {fits_filename} HDU {hdu_num}: Tried to use as an image, but not an image")]
    NotImage {
        fits_filename: Box<Path>,
        hdu_num: usize,
        source_file: &'static str,
        source_line: u32,
        source_column: u32,
    },

    /// An image that doesn't have two axes.
    #[error("{source_file}:{source_line}:{source_column}: {fits_filename} HDU {hdu_num}: Expected a 2D image, but it has shape {shape:?}")]
    Not2D {
        shape: Vec<usize>,
        fits_filename: Box<Path>,
        hdu_num: usize,
        source_file: &'static str,
        source_line: u32,
        source_column: u32,
    },

    /// A generic error associated with the fitsio crate.
    #[error("{source_file}:{source_line}:{source_column}: {fits_filename} HDU '{hdu_description}': {fits_error}")]
    Fitsio {
        fits_error: Box<fitsio::errors::Error>,
        fits_filename: Box<Path>,
        hdu_description: Box<str>,
        source_file: &'static str,
        source_line: u32,
        source_column: u32,
    },

    /// An error associated with parsing a string into another type.
    #[error("{source_file}:{source_line}:{source_column}: Couldn't parse {key} in {fits_filename} HDU {hdu_num}")]
    Parse {
        key: Box<str>,
        fits_filename: Box<Path>,
        hdu_num: usize,
        source_file: &'static str,
        source_line: u32,
        source_column: u32,
    },
}

impl FitsError {
    /// Wrap a fitsio error, recording where in our code it happened.
    pub(crate) fn fitsio(
        fits_error: fitsio::errors::Error,
        fits_filename: &Path,
        hdu_description: impl std::fmt::Display,
        caller: &'static Location<'static>,
    ) -> FitsError {
        FitsError::Fitsio {
            fits_error: Box::new(fits_error),
            fits_filename: fits_filename.to_path_buf().into_boxed_path(),
            hdu_description: hdu_description.to_string().into_boxed_str(),
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }
    }
}
