// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper functions for reading FITS files. Every helper is `#[track_caller]`
//! so that errors point at the code that asked for the read, not at this
//! module.

mod error;

pub use error::FitsError;

use std::{fmt::Display, panic::Location};

use fitsio::{hdu::*, FitsFile};
use ndarray::prelude::*;

/// Open a FITS file.
#[track_caller]
pub(crate) fn fits_open<P: AsRef<std::path::Path>>(file: P) -> Result<FitsFile, FitsError> {
    FitsFile::open(file.as_ref()).map_err(|e| {
        let caller = Location::caller();
        FitsError::Open {
            fits_error: Box::new(e),
            fits_filename: file.as_ref().to_path_buf().into_boxed_path(),
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }
    })
}

/// Open a FITS file's HDU, either by 0-based number or by EXTNAME.
#[track_caller]
pub(crate) fn fits_open_hdu<T: DescribesHdu + Display + Copy>(
    fits_fptr: &mut FitsFile,
    hdu_description: T,
) -> Result<FitsHdu, FitsError> {
    let caller = Location::caller();
    fits_fptr
        .hdu(hdu_description)
        .map_err(|e| FitsError::fitsio(e, fits_fptr.file_path(), hdu_description, caller))
}

/// Given a FITS file pointer, a HDU that belongs to it, and a keyword that may
/// or may not exist, pull out the value of the keyword, parsing it into the
/// desired type.
#[track_caller]
pub(crate) fn fits_get_optional_key<T: std::str::FromStr>(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    keyword: &str,
) -> Result<Option<T>, FitsError> {
    let caller = Location::caller();
    let unparsed_value: String = match hdu.read_key(fits_fptr, keyword) {
        Ok(key_value) => key_value,
        // 202 = KEY_NO_EXIST, 204 = VALUE_UNDEFINED
        Err(fitsio::errors::Error::Fits(fe)) if matches!(fe.status, 202 | 204) => return Ok(None),
        Err(e) => {
            return Err(FitsError::fitsio(
                e,
                fits_fptr.file_path(),
                hdu.number + 1,
                caller,
            ))
        }
    };

    match unparsed_value.trim().parse() {
        Ok(parsed_value) => Ok(Some(parsed_value)),
        Err(_) => Err(FitsError::Parse {
            key: keyword.to_string().into_boxed_str(),
            fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
            hdu_num: hdu.number + 1,
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }),
    }
}

/// Given a FITS file pointer, a HDU that belongs to it, and a keyword, pull out
/// the value of the keyword, parsing it into the desired type.
#[track_caller]
pub(crate) fn fits_get_required_key<T: std::str::FromStr>(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    keyword: &str,
) -> Result<T, FitsError> {
    match fits_get_optional_key(fits_fptr, hdu, keyword)? {
        Some(value) => Ok(value),
        None => {
            let caller = Location::caller();
            Err(FitsError::MissingKey {
                key: keyword.to_string().into_boxed_str(),
                fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
                hdu_num: hdu.number + 1,
                source_file: caller.file(),
                source_line: caller.line(),
                source_column: caller.column(),
            })
        }
    }
}

/// Read a 2D image HDU into an array of shape (rows, columns). Whatever the
/// on-disk type, the pixels are promoted to `f64`.
#[track_caller]
pub(crate) fn fits_get_image_2d(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
) -> Result<Array2<f64>, FitsError> {
    let caller = Location::caller();
    let shape = match &hdu.info {
        HduInfo::ImageInfo { shape, .. } => shape.clone(),
        _ => {
            return Err(FitsError::NotImage {
                fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
                hdu_num: hdu.number + 1,
                source_file: caller.file(),
                source_line: caller.line(),
                source_column: caller.column(),
            })
        }
    };
    let (num_rows, num_cols) = match shape.as_slice() {
        [r, c] => (*r, *c),
        _ => {
            return Err(FitsError::Not2D {
                shape,
                fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
                hdu_num: hdu.number + 1,
                source_file: caller.file(),
                source_line: caller.line(),
                source_column: caller.column(),
            })
        }
    };

    let pixels: Vec<f64> = hdu
        .read_image(fits_fptr)
        .map_err(|e| FitsError::fitsio(e, fits_fptr.file_path(), hdu.number + 1, caller))?;
    // cfitsio hands back exactly rows * cols values for a 2D image.
    Array2::from_shape_vec((num_rows, num_cols), pixels).map_err(|_| FitsError::Not2D {
        shape: vec![num_rows, num_cols],
        fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
        hdu_num: hdu.number + 1,
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    })
}
