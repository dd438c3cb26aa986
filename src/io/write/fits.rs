// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper functions for writing FITS files. Like the reading helpers, these
//! are `#[track_caller]` so that errors point at the caller.

use std::{panic::Location, path::Path};

use fitsio::{
    hdu::{FitsHdu, HduInfo},
    headers::WritesKey,
    images::{ImageDescription, ImageType},
    FitsFile,
};

use crate::io::read::fits::FitsError;

/// Create a new FITS file whose primary HDU is a 2D `f64` image of `shape`
/// (rows, columns). An existing file at `file` is replaced.
#[track_caller]
pub(crate) fn fits_create_with_primary_image<P: AsRef<Path>>(
    file: P,
    shape: (usize, usize),
) -> Result<FitsFile, FitsError> {
    let caller = Location::caller();
    let file = file.as_ref();
    let open_error = |e: fitsio::errors::Error| FitsError::Open {
        fits_error: Box::new(e),
        fits_filename: file.to_path_buf().into_boxed_path(),
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    };

    if file.exists() {
        std::fs::remove_file(file)
            .map_err(|e| open_error(fitsio::errors::Error::Message(e.to_string())))?;
    }
    FitsFile::create(file)
        .with_custom_primary(&ImageDescription {
            data_type: ImageType::Double,
            dimensions: &[shape.0, shape.1],
        })
        .open()
        .map_err(open_error)
}

/// Append a 2D `f64` image HDU called `extname`.
#[track_caller]
pub(crate) fn fits_create_image(
    fits_fptr: &mut FitsFile,
    extname: &str,
    shape: (usize, usize),
) -> Result<FitsHdu, FitsError> {
    let caller = Location::caller();
    fits_fptr
        .create_image(
            extname,
            &ImageDescription {
                data_type: ImageType::Double,
                dimensions: &[shape.0, shape.1],
            },
        )
        .map_err(|e| FitsError::fitsio(e, fits_fptr.file_path(), extname, caller))
}

/// Given a FITS file pointer and a HDU, write the image.
#[track_caller]
pub(crate) fn fits_write_image<T: fitsio::images::WriteImage>(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    data: &[T],
) -> Result<(), FitsError> {
    let caller = Location::caller();
    match &hdu.info {
        HduInfo::ImageInfo { .. } => hdu
            .write_image(fits_fptr, data)
            .map_err(|e| FitsError::fitsio(e, fits_fptr.file_path(), hdu.number + 1, caller)),
        _ => Err(FitsError::NotImage {
            fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
            hdu_num: hdu.number + 1,
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }),
    }
}

/// Write a header keyword to a HDU.
#[track_caller]
pub(crate) fn fits_write_key<T: WritesKey>(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    keyword: &str,
    value: T,
) -> Result<(), FitsError> {
    let caller = Location::caller();
    hdu.write_key(fits_fptr, keyword, value)
        .map_err(|e| FitsError::fitsio(e, fits_fptr.file_path(), hdu.number + 1, caller))
}
